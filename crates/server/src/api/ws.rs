//! The Alert stream interface (§6): `GET /v1/alerts/stream`, a websocket
//! emitting one record per proximity state transition.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

pub async fn alerts_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut alerts = state.subscribe_alerts();

    loop {
        match alerts.recv().await {
            Ok(alert) => match serde_json::to_string(&alert) {
                Ok(json) => {
                    if socket.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "failed to serialize proximity alert");
                }
            },
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "alert stream subscriber lagged, dropping backlog");
                continue;
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        }
    }
}
