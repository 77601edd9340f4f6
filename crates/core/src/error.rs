//! The core's typed error taxonomy (§7 of the design spec).
//!
//! `ConflictDetected` is deliberately not a variant here: the spec calls it
//! "informational, not fatal", and we represent that in the type system by
//! folding it into [`crate::decision::Decision::Rejected`] rather than the
//! error path — an `Err` in this crate always means the submission could not
//! be evaluated at all, not that it was evaluated and found unsafe.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeconflictionError {
    #[error("invalid time window: end_time must be strictly after start_time")]
    InvalidWindow,

    #[error("waypoint list must not be empty")]
    EmptyWaypoints,

    #[error("unknown or disconnected drone: {0}")]
    UnknownDrone(String),

    #[error("trajectory generation failed: {0}")]
    TrajectoryGenerationFailed(String),

    #[error("store busy: lock acquisition timed out after {0:?}")]
    StoreBusy(Duration),

    #[error("store corrupt: {0}")]
    StoreCorrupt(String),
}

impl DeconflictionError {
    /// Whether a client may reasonably retry the same request unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DeconflictionError::StoreBusy(_) | DeconflictionError::TrajectoryGenerationFailed(_)
        )
    }

    /// Whether this error indicates a broken invariant requiring operator
    /// intervention (halts the coordinator, per §7 propagation policy).
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeconflictionError::StoreCorrupt(_))
    }
}
