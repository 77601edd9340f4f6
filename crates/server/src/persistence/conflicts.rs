//! Append-only conflict log persistence (§6 persisted layout, `conflicts`).
//!
//! Every Conflict ever detected is recorded here, independent of whether the
//! submission that triggered it was ultimately accepted or rejected (§4.3).

use anyhow::Result;
use deconfliction_core::Conflict;
use sqlx::SqlitePool;

pub async fn insert_all(pool: &SqlitePool, conflicts: &[Conflict]) -> Result<()> {
    if conflicts.is_empty() {
        return Ok(());
    }
    let mut tx = pool.begin().await?;
    for conflict in conflicts {
        let position_a = serde_json::to_string(&conflict.position_a)?;
        let position_b = serde_json::to_string(&conflict.position_b)?;
        sqlx::query(
            r#"
            INSERT INTO conflicts
                (time, drone_a, drone_b, distance, position_a, position_b, safety_buffer)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(conflict.time.to_rfc3339())
        .bind(&conflict.drone_a)
        .bind(&conflict.drone_b)
        .bind(conflict.distance)
        .bind(position_a)
        .bind(position_b)
        .bind(conflict.safety_buffer)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}
