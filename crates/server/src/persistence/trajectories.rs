//! Committed trajectory sample persistence: the durable image of C2, the
//! trajectory store (§6 persisted layout, `committed_trajectory_points`).

use anyhow::Result;
use chrono::{DateTime, Utc};
use deconfliction_core::{Position, Trajectory, TrajectoryPoint};
use sqlx::SqlitePool;

/// Replace every durable sample for `drone_id` with `trajectory`'s samples,
/// inside one transaction so a torn write is never visible to a reader
/// restarting mid-write (mirrors the in-memory store's atomic `put`).
pub async fn replace_for_drone(
    pool: &SqlitePool,
    drone_id: &str,
    trajectory: &Trajectory,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM committed_trajectory_points WHERE drone_id = ?1")
        .bind(drone_id)
        .execute(&mut *tx)
        .await?;

    for point in trajectory.points() {
        sqlx::query(
            r#"
            INSERT INTO committed_trajectory_points
                (drone_id, timestamp, x, y, z, segment_index, is_waypoint, mission_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&point.drone_id)
        .bind(point.timestamp.to_rfc3339())
        .bind(point.position.x)
        .bind(point.position.y)
        .bind(point.position.z)
        .bind(point.segment_index as i64)
        .bind(point.is_waypoint)
        .bind(&point.mission_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn delete_for_drone(pool: &SqlitePool, drone_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM committed_trajectory_points WHERE drone_id = ?1")
        .bind(drone_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_for_mission(pool: &SqlitePool, mission_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM committed_trajectory_points WHERE mission_id = ?1")
        .bind(mission_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_older_than(pool: &SqlitePool, cutoff: DateTime<Utc>) -> Result<()> {
    sqlx::query("DELETE FROM committed_trajectory_points WHERE timestamp < ?1")
        .bind(cutoff.to_rfc3339())
        .execute(pool)
        .await?;
    Ok(())
}

/// Load every committed sample, grouped by drone, to rehydrate the
/// in-memory store on process start (§10.4).
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<(String, Trajectory)>> {
    let rows: Vec<(String, String, f64, f64, f64, i64, bool, Option<String>)> = sqlx::query_as(
        r#"
        SELECT drone_id, timestamp, x, y, z, segment_index, is_waypoint, mission_id
        FROM committed_trajectory_points
        ORDER BY drone_id, timestamp ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_drone: std::collections::BTreeMap<String, Vec<TrajectoryPoint>> =
        std::collections::BTreeMap::new();

    for (drone_id, timestamp, x, y, z, segment_index, is_waypoint, mission_id) in rows {
        let Ok(timestamp) = DateTime::parse_from_rfc3339(&timestamp) else {
            continue;
        };
        by_drone
            .entry(drone_id.clone())
            .or_default()
            .push(TrajectoryPoint {
                drone_id,
                timestamp: timestamp.with_timezone(&Utc),
                position: Position::new(x, y, z),
                segment_index: segment_index as usize,
                is_waypoint,
                mission_id,
            });
    }

    Ok(by_drone
        .into_iter()
        .map(|(drone_id, points)| (drone_id, Trajectory::new(points)))
        .collect())
}
