//! The realtime proximity monitor's poll loop (C6, §4.6): polls the
//! live-state source every Δ_poll and broadcasts an alert for every
//! proximity state transition. Cadence and lifetime are owned by the
//! process supervisor (§10.5), not an unbounded sleep loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::interval;

use deconfliction_core::{LiveStateSource, Severity};

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let poll_interval = state.config().poll_interval.max(0.01);
    let mut ticker = interval(Duration::from_secs_f64(poll_interval));

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("proximity monitor shutting down");
                return;
            }
            _ = ticker.tick() => {
                let positions = state.live_state().all_positions().await;
                let now = Utc::now();
                let alerts = state.monitor().lock().await.poll_once(now, &positions);
                for alert in alerts {
                    match alert.severity {
                        Severity::High => tracing::error!(
                            drone_a = %alert.drone_a,
                            drone_b = %alert.drone_b,
                            distance = alert.distance,
                            "proximity alert: CRITICAL"
                        ),
                        Severity::Medium => tracing::warn!(
                            drone_a = %alert.drone_a,
                            drone_b = %alert.drone_b,
                            distance = alert.distance,
                            "proximity alert: APPROACHING"
                        ),
                        Severity::Low => tracing::info!(
                            drone_a = %alert.drone_a,
                            drone_b = %alert.drone_b,
                            distance = alert.distance,
                            "proximity alert: CLEARING"
                        ),
                    }
                    state.publish_alert(alert);
                }
                state.record_loop_tick("proximity-monitor");
            }
        }
    }
}
