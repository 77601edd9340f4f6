//! The periodic garbage collector (§5): wakes on a fixed interval and takes
//! the store's write lock briefly to drop committed samples that lie
//! entirely in the past (invariant 5, §3).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::interval;

use crate::state::AppState;

pub async fn run(state: Arc<AppState>, mut shutdown: broadcast::Receiver<()>) {
    let gc_interval = state.config().engine.gc_interval.max(1.0);
    let grace = chrono::Duration::seconds(state.config().gc_grace_seconds);
    let mut ticker = interval(Duration::from_secs_f64(gc_interval));

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("gc loop shutting down");
                return;
            }
            _ = ticker.tick() => {
                let cutoff = Utc::now() - grace;
                state.store().gc(cutoff);
                if let Err(err) =
                    crate::persistence::trajectories::delete_older_than(state.database().pool(), cutoff)
                        .await
                {
                    tracing::error!(error = %err, "failed to persist gc sweep");
                }
                tracing::info!(cutoff = %cutoff, "gc sweep complete");
                state.record_loop_tick("gc");
            }
        }
    }
}
