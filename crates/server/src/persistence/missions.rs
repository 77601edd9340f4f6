//! Mission record persistence (§6 persisted layout, `missions` table).

use anyhow::Result;
use chrono::{DateTime, Utc};
use deconfliction_core::{Mission, MissionStatus, Position};
use sqlx::SqlitePool;

fn status_str(status: MissionStatus) -> &'static str {
    match status {
        MissionStatus::Scheduled => "scheduled",
        MissionStatus::Executing => "executing",
        MissionStatus::Completed => "completed",
        MissionStatus::Failed => "failed",
        MissionStatus::Cancelled => "cancelled",
    }
}

/// Insert a newly accepted mission with `status = scheduled`.
pub async fn insert(pool: &SqlitePool, mission: &Mission) -> Result<()> {
    let waypoints = serde_json::to_string(&mission.waypoints)?;
    sqlx::query(
        r#"
        INSERT INTO missions (mission_id, drone_id, waypoints, start_time, end_time, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&mission.mission_id)
    .bind(&mission.drone_id)
    .bind(waypoints)
    .bind(mission.start_time.to_rfc3339())
    .bind(mission.end_time.to_rfc3339())
    .bind(status_str(mission.status))
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_status(pool: &SqlitePool, mission_id: &str, status: MissionStatus) -> Result<()> {
    sqlx::query("UPDATE missions SET status = ?1 WHERE mission_id = ?2")
        .bind(status_str(status))
        .bind(mission_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_for_drone(pool: &SqlitePool, drone_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM missions WHERE drone_id = ?1")
        .bind(drone_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, mission_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM missions WHERE mission_id = ?1")
        .bind(mission_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[allow(dead_code)]
pub struct MissionRow {
    pub mission_id: String,
    pub drone_id: String,
    pub waypoints: Vec<Position>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}
