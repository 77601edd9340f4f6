//! HTTP/websocket client for the deconfliction server, in the shape of the
//! reference deployment's `AtcClient`: a thin wrapper that knows the wire
//! format of each endpoint and nothing about the engine's internals.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Serialize)]
struct SubmitMissionRequest<'a> {
    drone_id: &'a str,
    waypoints: &'a [[f64; 3]],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ReportPositionRequest {
    x: f64,
    y: f64,
    z: f64,
}

/// The decoded result of a mission submission: either side of the §4.4
/// accept/reject fork.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SubmitOutcome {
    Accepted {
        accepted: bool,
        mission_id: String,
    },
    Rejected {
        accepted: bool,
        conflicts: Vec<serde_json::Value>,
        suggestions: Vec<serde_json::Value>,
    },
}

/// Client for the deconfliction server's HTTP/websocket surface.
pub struct DeconflictionClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeconflictionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Report a drone's current position, standing in for the telemetry
    /// link the engine itself does not own.
    pub async fn report_position(&self, drone_id: &str, x: f64, y: f64, z: f64) -> Result<()> {
        let url = format!("{}/v1/drones/{}/position", self.base_url, drone_id);
        let response = self
            .http
            .post(&url)
            .json(&ReportPositionRequest { x, y, z })
            .send()
            .await
            .context("failed to report position")?;
        if !response.status().is_success() {
            bail!("position report rejected: {}", response.status());
        }
        Ok(())
    }

    /// Submit a candidate mission and decode the accept/reject response.
    pub async fn submit_mission(
        &self,
        drone_id: &str,
        waypoints: &[[f64; 3]],
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<SubmitOutcome> {
        let url = format!("{}/v1/missions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&SubmitMissionRequest {
                drone_id,
                waypoints,
                start_time,
                end_time,
            })
            .send()
            .await
            .context("failed to submit mission")?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() && status.as_u16() != 409 {
            bail!("mission submission failed ({}): {}", status, body);
        }
        Ok(serde_json::from_str(&body)
            .with_context(|| format!("unexpected response body: {body}"))?)
    }

    /// Emergency-clear a single drone (§6).
    pub async fn clear_drone(&self, drone_id: &str) -> Result<()> {
        let url = format!("{}/v1/drones/{}/clear", self.base_url, drone_id);
        self.http.post(&url).send().await?;
        Ok(())
    }

    /// Emergency-clear the entire fleet (§6 wildcard form).
    pub async fn clear_all(&self) -> Result<()> {
        let url = format!("{}/v1/clear", self.base_url);
        self.http.post(&url).send().await?;
        Ok(())
    }

    /// Connect to the proximity alert stream and invoke `on_alert` for each
    /// message received until the connection closes.
    pub async fn watch_alerts(&self, mut on_alert: impl FnMut(serde_json::Value)) -> Result<()> {
        let ws_url = self.base_url.replacen("http", "ws", 1);
        let url = format!("{ws_url}/v1/alerts/stream");
        let (mut socket, _) = tokio_tungstenite::connect_async(&url)
            .await
            .with_context(|| format!("failed to connect to alert stream at {url}"))?;

        while let Some(message) = socket.next().await {
            match message? {
                Message::Text(text) => {
                    if let Ok(value) = serde_json::from_str(&text) {
                        on_alert(value);
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Ok(())
    }
}
