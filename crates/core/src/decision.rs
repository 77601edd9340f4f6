//! The coordinator's verdict on a submitted mission (§3 data model).

use crate::conflict::Conflict;
use crate::suggestion::Suggestion;
use crate::trajectory::MissionId;

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accepted { mission_id: MissionId },
    Rejected {
        conflicts: Vec<Conflict>,
        suggestions: Vec<Suggestion>,
    },
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted { .. })
    }
}
