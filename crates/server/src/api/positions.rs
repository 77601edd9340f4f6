//! Position-report ingest: feeds the live-state source the coordinator and
//! realtime monitor read through. The real telemetry link (MAVLink or
//! similar) is an external collaborator (§1 out of scope); this endpoint is
//! the stand-in a test harness or simulator uses to report "the drone is
//! here now", mirroring the reference deployment's own telemetry-ingest
//! shape narrowed to position only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use deconfliction_core::Position;
use serde::Deserialize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportPositionRequest {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

pub async fn report_position(
    State(state): State<Arc<AppState>>,
    Path(drone_id): Path<String>,
    Json(request): Json<ReportPositionRequest>,
) -> StatusCode {
    let position = Position::new(request.x, request.y, request.z);
    let now = Utc::now();
    state.live_state().update(drone_id.clone(), position, now);

    if let Err(err) =
        crate::persistence::drones::upsert_position(state.database().pool(), &drone_id, position, now)
            .await
    {
        tracing::error!(error = %err, "failed to persist drone position report");
    }

    StatusCode::ACCEPTED
}
