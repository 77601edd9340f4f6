//! Application state: the one long-lived value constructed at startup and
//! handed to every request handler and background loop (§9 — no ambient
//! globals).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use deconfliction_core::{Coordinator, ProximityAlert, ProximityMonitor, TrajectoryStore};
use tokio::sync::{broadcast, Mutex};

use crate::config::Config;
use crate::persistence::Database;
use crate::state::live_state::InMemoryLiveState;

const ALERT_CHANNEL_CAPACITY: usize = 256;

pub struct AppState {
    coordinator: Arc<Coordinator>,
    live_state: Arc<InMemoryLiveState>,
    monitor: Mutex<ProximityMonitor>,
    alerts_tx: broadcast::Sender<ProximityAlert>,
    db: Database,
    config: Config,
    loop_ticks: DashMap<&'static str, AtomicU64>,
}

impl AppState {
    pub fn new(db: Database, config: Config, live_state: Arc<InMemoryLiveState>) -> Self {
        let store = Arc::new(TrajectoryStore::new());
        let monitor = ProximityMonitor::new(config.engine.safety_buffer, config.engine.hysteresis);
        let (alerts_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        let coordinator = Coordinator::new(store, live_state.clone(), config.engine.clone());

        Self {
            coordinator: Arc::new(coordinator),
            live_state,
            monitor: Mutex::new(monitor),
            alerts_tx,
            db,
            config,
            loop_ticks: DashMap::new(),
        }
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Arc<TrajectoryStore> {
        self.coordinator.store()
    }

    pub fn live_state(&self) -> &Arc<InMemoryLiveState> {
        &self.live_state
    }

    pub fn monitor(&self) -> &Mutex<ProximityMonitor> {
        &self.monitor
    }

    pub fn subscribe_alerts(&self) -> broadcast::Receiver<ProximityAlert> {
        self.alerts_tx.subscribe()
    }

    pub fn publish_alert(&self, alert: ProximityAlert) {
        // No subscribers is a normal state (no websocket clients connected
        // yet); the send error is not a fault.
        let _ = self.alerts_tx.send(alert);
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Record that a background loop completed a tick, for `/ready`.
    pub fn record_loop_tick(&self, name: &'static str) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.loop_ticks
            .entry(name)
            .or_insert_with(|| AtomicU64::new(0))
            .store(now, Ordering::Relaxed);
    }

    pub fn loop_last_tick_secs(&self, name: &str) -> Option<u64> {
        self.loop_ticks
            .get(name)
            .map(|entry| entry.load(Ordering::Relaxed))
    }
}
