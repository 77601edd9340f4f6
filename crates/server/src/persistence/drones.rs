//! Drone current-position persistence: the durable image of the live-state
//! source's "last known position" (§6 persisted layout, `drones` table).

use anyhow::Result;
use chrono::{DateTime, Utc};
use deconfliction_core::Position;
use sqlx::SqlitePool;

pub struct DroneRow {
    pub drone_id: String,
    pub position: Position,
    pub last_seen: DateTime<Utc>,
}

/// Upsert a drone's last known position.
pub async fn upsert_position(
    pool: &SqlitePool,
    drone_id: &str,
    position: Position,
    last_seen: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drones (drone_id, x, y, z, last_seen)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(drone_id) DO UPDATE SET
            x = ?2, y = ?3, z = ?4, last_seen = ?5
        "#,
    )
    .bind(drone_id)
    .bind(position.x)
    .bind(position.y)
    .bind(position.z)
    .bind(last_seen.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load every drone's last known position, used to rehydrate the live-state
/// source on process start.
pub async fn load_all(pool: &SqlitePool) -> Result<Vec<DroneRow>> {
    let rows: Vec<(String, f64, f64, f64, String)> =
        sqlx::query_as("SELECT drone_id, x, y, z, last_seen FROM drones")
            .fetch_all(pool)
            .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(drone_id, x, y, z, last_seen)| {
            DateTime::parse_from_rfc3339(&last_seen)
                .ok()
                .map(|ts| DroneRow {
                    drone_id,
                    position: Position::new(x, y, z),
                    last_seen: ts.with_timezone(&Utc),
                })
        })
        .collect())
}
