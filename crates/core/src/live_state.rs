//! The capability abstraction the coordinator and monitor use to read each
//! drone's current position. Real drone connectivity (telemetry ingest,
//! MAVLink, whatever the fleet actually speaks) lives entirely outside this
//! crate; fakes are supplied explicitly in tests rather than a duck-typed
//! dummy implementation (§9 Design Notes).

use std::collections::HashMap;

use async_trait::async_trait;

use crate::geometry::Position;
use crate::trajectory::DroneId;

#[async_trait]
pub trait LiveStateSource: Send + Sync {
    /// The drone's last known position, or `None` if it has never reported
    /// one (or is currently disconnected with nothing on record).
    async fn current_position(&self, drone_id: &str) -> Option<Position>;

    /// Current positions of every drone the source knows about, used by the
    /// realtime proximity monitor (C6).
    async fn all_positions(&self) -> HashMap<DroneId, Position>;
}
