//! The thin HTTP/websocket adapter (§6). Request parsing, JSON shaping, and
//! HTTP status mapping only — all accept/reject logic lives in the core.

mod clear;
pub mod error;
mod health;
mod missions;
mod positions;
mod trajectories;
mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/missions", post(missions::submit_mission))
        .route("/v1/trajectories", get(trajectories::query_trajectories))
        .route("/v1/drones/:id/clear", post(clear::clear_drone))
        .route("/v1/clear", post(clear::clear_all))
        .route("/v1/drones/:id/position", post(positions::report_position))
        .route("/v1/alerts/stream", get(ws::alerts_stream))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
}
