//! The Mission record (§3 data model). Mission lifecycle transitions past
//! `scheduled` are driven by the external mission executor, not this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::trajectory::{DroneId, MissionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Scheduled,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: MissionId,
    pub drone_id: DroneId,
    pub waypoints: Vec<Position>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: MissionStatus,
}

impl Mission {
    pub fn new_scheduled(
        mission_id: MissionId,
        drone_id: DroneId,
        waypoints: Vec<Position>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            mission_id,
            drone_id,
            waypoints,
            start_time,
            end_time,
            status: MissionStatus::Scheduled,
        }
    }
}
