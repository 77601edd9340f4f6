//! Maps `DeconflictionError` to HTTP status codes at the adapter boundary
//! (§10.2). This is the only place the core's error taxonomy is translated
//! into wire shape; no accept/reject logic lives here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use deconfliction_core::DeconflictionError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub struct ApiError(pub DeconflictionError);

impl From<DeconflictionError> for ApiError {
    fn from(err: DeconflictionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DeconflictionError::InvalidWindow
            | DeconflictionError::EmptyWaypoints
            | DeconflictionError::UnknownDrone(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DeconflictionError::TrajectoryGenerationFailed(_)
            | DeconflictionError::StoreBusy(_) => StatusCode::SERVICE_UNAVAILABLE,
            DeconflictionError::StoreCorrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if self.0.is_fatal() {
            tracing::error!(error = %self.0, "store corrupt: halting coordinator pending operator intervention");
        } else if self.0.is_transient() {
            tracing::warn!(error = %self.0, "transient error, client may retry");
        } else {
            tracing::info!(error = %self.0, "client-side validation failure");
        }

        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}
