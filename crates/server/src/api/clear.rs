//! The Emergency clear interface (§6): invokes `forget` on the store. Does
//! not command the drones themselves.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::state::AppState;

pub async fn clear_drone(
    State(state): State<Arc<AppState>>,
    Path(drone_id): Path<String>,
) -> StatusCode {
    tracing::warn!(drone_id = %drone_id, "emergency clear for drone");
    state.store().forget(&drone_id);
    if let Err(err) = crate::persistence::trajectories::delete_for_drone(
        state.database().pool(),
        &drone_id,
    )
    .await
    {
        tracing::error!(error = %err, "failed to persist emergency clear");
    }
    if let Err(err) =
        crate::persistence::missions::delete_for_drone(state.database().pool(), &drone_id).await
    {
        tracing::error!(error = %err, "failed to persist emergency clear mission removal");
    }
    StatusCode::NO_CONTENT
}

pub async fn clear_all(State(state): State<Arc<AppState>>) -> StatusCode {
    tracing::warn!("emergency clear for entire fleet");
    let drone_ids = state.store().drone_ids();

    for drone_id in &drone_ids {
        state.store().forget(drone_id);
    }

    if let Err(err) = sqlx::query("DELETE FROM committed_trajectory_points")
        .execute(state.database().pool())
        .await
    {
        tracing::error!(error = %err, "failed to persist wildcard emergency clear");
    }
    if let Err(err) = sqlx::query("DELETE FROM missions")
        .execute(state.database().pool())
        .await
    {
        tracing::error!(error = %err, "failed to persist wildcard mission removal");
    }

    StatusCode::NO_CONTENT
}
