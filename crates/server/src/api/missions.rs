//! The Submit interface (§6): `POST /v1/missions`.
//!
//! Pure adapter: parses the request, forwards it to the coordinator, shapes
//! the `Decision` as JSON. All accept/reject logic lives in C4.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use deconfliction_core::{Conflict, Decision, Mission, Position, Suggestion};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitMissionRequest {
    pub drone_id: String,
    pub waypoints: Vec<[f64; 3]>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SubmitMissionResponse {
    Accepted {
        accepted: bool,
        mission_id: String,
    },
    Rejected {
        accepted: bool,
        conflicts: Vec<Conflict>,
        suggestions: Vec<Suggestion>,
    },
}

pub async fn submit_mission(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SubmitMissionRequest>,
) -> Result<Response, ApiError> {
    let waypoints: Vec<Position> = request
        .waypoints
        .iter()
        .map(|w| Position::new(w[0], w[1], w[2]))
        .collect();

    let decision = state
        .coordinator()
        .submit(
            request.drone_id.clone(),
            waypoints.clone(),
            request.start_time,
            request.end_time,
        )
        .await?;

    match decision {
        Decision::Accepted { mission_id } => {
            tracing::info!(
                drone_id = %request.drone_id,
                mission_id = %mission_id,
                "mission accepted"
            );

            let mission = Mission::new_scheduled(
                mission_id.clone(),
                request.drone_id.clone(),
                waypoints,
                request.start_time,
                request.end_time,
            );
            if let Err(err) = crate::persistence::missions::insert(state.database().pool(), &mission).await
            {
                tracing::error!(error = %err, "failed to persist accepted mission");
            }
            if let Some(trajectory) = state.store().query(request.start_time, request.end_time).get(&request.drone_id)
            {
                if let Err(err) = crate::persistence::trajectories::replace_for_drone(
                    state.database().pool(),
                    &request.drone_id,
                    trajectory,
                )
                .await
                {
                    tracing::error!(error = %err, "failed to persist committed trajectory");
                }
            }

            Ok((
                StatusCode::OK,
                Json(SubmitMissionResponse::Accepted {
                    accepted: true,
                    mission_id,
                }),
            )
                .into_response())
        }
        Decision::Rejected {
            conflicts,
            suggestions,
        } => {
            tracing::warn!(
                drone_id = %request.drone_id,
                conflict_count = conflicts.len(),
                "mission rejected"
            );
            if let Err(err) =
                crate::persistence::conflicts::insert_all(state.database().pool(), &conflicts).await
            {
                tracing::error!(error = %err, "failed to persist conflict log entries");
            }

            Ok((
                StatusCode::CONFLICT,
                Json(SubmitMissionResponse::Rejected {
                    accepted: false,
                    conflicts,
                    suggestions,
                }),
            )
                .into_response())
        }
    }
}
