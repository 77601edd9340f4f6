//! The Query interface (§6): `GET /v1/trajectories?start=..&end=..`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TrajectoryQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TrajectoryPointView {
    pub time: DateTime<Utc>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub segment: usize,
    pub is_waypoint: bool,
}

pub async fn query_trajectories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrajectoryQuery>,
) -> Json<HashMap<String, Vec<TrajectoryPointView>>> {
    let trajectories = state.store().query(query.start, query.end);

    let out = trajectories
        .into_iter()
        .map(|(drone_id, trajectory)| {
            let points = trajectory
                .points()
                .iter()
                .map(|p| TrajectoryPointView {
                    time: p.timestamp,
                    x: p.position.x,
                    y: p.position.y,
                    z: p.position.z,
                    segment: p.segment_index,
                    is_waypoint: p.is_waypoint,
                })
                .collect();
            (drone_id, points)
        })
        .collect();

    Json(out)
}
