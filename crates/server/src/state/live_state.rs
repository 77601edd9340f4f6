//! In-memory live-state source: each drone's last known position, the
//! capability the coordinator and the realtime monitor read through
//! [`deconfliction_core::LiveStateSource`].
//!
//! Real drone connectivity (telemetry ingest, MAVLink, whatever the fleet
//! actually speaks) is an external collaborator; this adapter is fed by the
//! position-report endpoint (§6) and is the durable `drones` table's
//! in-memory mirror, the same write-through shape the store uses for
//! trajectories.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use deconfliction_core::{DroneId, LiveStateSource, Position};

#[derive(Debug, Default)]
pub struct InMemoryLiveState {
    positions: DashMap<DroneId, (Position, DateTime<Utc>)>,
}

impl InMemoryLiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, drone_id: DroneId, position: Position, at: DateTime<Utc>) {
        self.positions.insert(drone_id, (position, at));
    }

    pub fn last_seen(&self, drone_id: &str) -> Option<DateTime<Utc>> {
        self.positions.get(drone_id).map(|entry| entry.1)
    }
}

#[async_trait]
impl LiveStateSource for InMemoryLiveState {
    async fn current_position(&self, drone_id: &str) -> Option<Position> {
        self.positions.get(drone_id).map(|entry| entry.0)
    }

    async fn all_positions(&self) -> HashMap<DroneId, Position> {
        self.positions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_none_for_unknown_drone() {
        let live_state = InMemoryLiveState::new();
        assert_eq!(live_state.current_position("D1").await, None);
    }

    #[tokio::test]
    async fn reports_last_updated_position() {
        let live_state = InMemoryLiveState::new();
        let now = Utc::now();
        live_state.update("D1".into(), Position::new(1.0, 2.0, 3.0), now);
        assert_eq!(
            live_state.current_position("D1").await,
            Some(Position::new(1.0, 2.0, 3.0))
        );
        assert_eq!(live_state.all_positions().await.len(), 1);
    }
}
