//! The C3 conflict detector: time-aligns a candidate trajectory against
//! every other tracked trajectory and reports safety-buffer violations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::trajectory::{DroneId, Trajectory, TrajectoryPoint};

/// A single violating aligned pair. One entry per violating sample pair, not
/// deduplicated, so the caller can see the full time-extent of the
/// infraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub time: DateTime<Utc>,
    pub drone_a: DroneId,
    pub drone_b: DroneId,
    pub position_a: Position,
    pub position_b: Position,
    pub distance: f64,
    pub safety_buffer: f64,
}

/// A non-empty set of conflicts produced by one coordinator decision,
/// together with the time span they cover (used by the suggestion
/// generator).
#[derive(Debug, Clone)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
}

impl ConflictReport {
    /// Returns `None` if `conflicts` is empty — a report only exists for a
    /// rejected submission.
    pub fn new(conflicts: Vec<Conflict>) -> Option<Self> {
        if conflicts.is_empty() {
            None
        } else {
            Some(Self { conflicts })
        }
    }

    pub fn earliest_time(&self) -> DateTime<Utc> {
        self.conflicts.iter().map(|c| c.time).min().expect("non-empty by construction")
    }

    pub fn latest_time(&self) -> DateTime<Utc> {
        self.conflicts.iter().map(|c| c.time).max().expect("non-empty by construction")
    }

    pub fn conflict_positions(&self) -> Vec<Position> {
        self.conflicts
            .iter()
            .flat_map(|c| [c.position_a, c.position_b])
            .collect()
    }
}

/// Find, among `other`'s samples, the one whose timestamp is nearest to
/// `target`. Ties are broken toward the earlier sample (§4.3 tie-breaking).
fn nearest_in_time<'a>(
    other: &[&'a TrajectoryPoint],
    target: DateTime<Utc>,
) -> Option<&'a TrajectoryPoint> {
    let mut best: Option<&TrajectoryPoint> = None;
    let mut best_delta = chrono::Duration::max_value();
    for &point in other {
        let delta = if point.timestamp >= target {
            point.timestamp - target
        } else {
            target - point.timestamp
        };
        let better = match best {
            None => true,
            Some(b) => {
                let b_delta = if b.timestamp >= target {
                    b.timestamp - target
                } else {
                    target - b.timestamp
                };
                delta < b_delta || (delta == b_delta && point.timestamp < b.timestamp)
            }
        };
        if better {
            best = Some(point);
            best_delta = delta;
        }
    }
    let _ = best_delta;
    best
}

/// Time-align `candidate` against every trajectory in `others` and report
/// every violating aligned pair (§4.3).
///
/// `candidate_start`/`candidate_end` are the candidate mission's own window
/// (the `start_time`/`end_time` it was generated for, per §4.1) — not
/// necessarily the first/last sample timestamp of `candidate` itself, since
/// the zero-distance edge case (§4.1) collapses a trajectory to a single
/// sample at `start_time` while the mission's `end_time` is later. Per
/// §4.3's exclusion clause, samples of an `others` trajectory that fall
/// outside this window are never aligned against — open-ended trajectories
/// are not supported, so a drone's committed samples before or after the
/// candidate's window are invisible to this check even if the drone's full
/// trajectory merely overlaps it.
pub fn check(
    candidate: &Trajectory,
    others: &HashMap<DroneId, Trajectory>,
    safety_buffer: f64,
    time_alignment_tolerance_s: f64,
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
) -> Vec<Conflict> {
    let tolerance = chrono::Duration::milliseconds((time_alignment_tolerance_s * 1000.0) as i64);
    let mut conflicts = Vec::new();

    for (other_drone_id, other_traj) in others {
        let in_window: Vec<&TrajectoryPoint> = other_traj
            .points()
            .iter()
            .filter(|p| p.timestamp >= candidate_start && p.timestamp <= candidate_end)
            .collect();
        if in_window.is_empty() {
            continue;
        }

        for a in candidate.points() {
            if other_drone_id == &a.drone_id {
                continue;
            }
            let Some(b) = nearest_in_time(&in_window, a.timestamp) else {
                continue;
            };
            let delta = if b.timestamp >= a.timestamp {
                b.timestamp - a.timestamp
            } else {
                a.timestamp - b.timestamp
            };
            if delta > tolerance {
                continue;
            }
            let distance = a.position.distance(&b.position);
            if distance < safety_buffer {
                conflicts.push(Conflict {
                    time: a.timestamp,
                    drone_a: a.drone_id.clone(),
                    drone_b: b.drone_id.clone(),
                    position_a: a.position,
                    position_b: b.position,
                    distance,
                    safety_buffer,
                });
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory;

    fn t(offset_s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_s, 0).unwrap()
    }

    #[test]
    fn empty_others_yields_no_conflicts() {
        let candidate = trajectory::generate(
            "D1",
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(50.0, 0.0, 10.0)],
            t(0),
            t(60),
            0.1,
        )
        .unwrap();
        let others = HashMap::new();
        assert!(check(&candidate, &others, 5.0, 0.5, t(0), t(60)).is_empty());
    }

    #[test]
    fn head_on_trajectories_conflict_near_midpoint() {
        let candidate = trajectory::generate(
            "D1",
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(50.0, 0.0, 10.0)],
            t(0),
            t(60),
            0.1,
        )
        .unwrap();
        let other = trajectory::generate(
            "D2",
            Position::new(50.0, 0.0, 10.0),
            &[Position::new(0.0, 0.0, 10.0)],
            t(0),
            t(60),
            0.1,
        )
        .unwrap();
        let mut others = HashMap::new();
        others.insert("D2".to_string(), other);

        let conflicts = check(&candidate, &others, 5.0, 0.5, t(0), t(60));
        assert!(!conflicts.is_empty());
        let near_mid = conflicts
            .iter()
            .any(|c| (c.time - t(30)).num_seconds().abs() <= 1 && (c.position_a.x - 25.0).abs() < 5.0);
        assert!(near_mid, "expected a conflict near (25,0,10) at ~T+30s");
    }

    #[test]
    fn distance_exactly_equal_to_buffer_is_safe() {
        let candidate = trajectory::Trajectory::new(vec![TrajectoryPoint {
            drone_id: "D1".into(),
            timestamp: t(0),
            position: Position::new(0.0, 0.0, 0.0),
            segment_index: 0,
            is_waypoint: true,
            mission_id: None,
        }]);
        let other = trajectory::Trajectory::new(vec![TrajectoryPoint {
            drone_id: "D2".into(),
            timestamp: t(0),
            position: Position::new(5.0, 0.0, 0.0),
            segment_index: 0,
            is_waypoint: true,
            mission_id: None,
        }]);
        let mut others = HashMap::new();
        others.insert("D2".to_string(), other);
        assert!(check(&candidate, &others, 5.0, 0.5, t(0), t(0)).is_empty());
    }

    #[test]
    fn time_delta_exactly_equal_to_tolerance_aligns() {
        let candidate = trajectory::Trajectory::new(vec![TrajectoryPoint {
            drone_id: "D1".into(),
            timestamp: t(0),
            position: Position::new(0.0, 0.0, 0.0),
            segment_index: 0,
            is_waypoint: true,
            mission_id: None,
        }]);
        let other = trajectory::Trajectory::new(vec![TrajectoryPoint {
            drone_id: "D2".into(),
            timestamp: t(0) + chrono::Duration::milliseconds(500),
            position: Position::new(0.0, 0.0, 0.0),
            segment_index: 0,
            is_waypoint: true,
            mission_id: None,
        }]);
        let mut others = HashMap::new();
        others.insert("D2".to_string(), other);
        let conflicts = check(&candidate, &others, 5.0, 0.5, t(0), t(1));
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn stationary_same_position_conflicts_at_every_aligned_pair() {
        let candidate = trajectory::Trajectory::new(vec![
            TrajectoryPoint {
                drone_id: "D1".into(),
                timestamp: t(0),
                position: Position::new(1.0, 1.0, 1.0),
                segment_index: 0,
                is_waypoint: false,
                mission_id: None,
            },
            TrajectoryPoint {
                drone_id: "D1".into(),
                timestamp: t(1),
                position: Position::new(1.0, 1.0, 1.0),
                segment_index: 0,
                is_waypoint: true,
                mission_id: None,
            },
        ]);
        let other = trajectory::Trajectory::new(vec![
            TrajectoryPoint {
                drone_id: "D2".into(),
                timestamp: t(0),
                position: Position::new(1.0, 1.0, 1.0),
                segment_index: 0,
                is_waypoint: false,
                mission_id: None,
            },
            TrajectoryPoint {
                drone_id: "D2".into(),
                timestamp: t(1),
                position: Position::new(1.0, 1.0, 1.0),
                segment_index: 0,
                is_waypoint: true,
                mission_id: None,
            },
        ]);
        let mut others = HashMap::new();
        others.insert("D2".to_string(), other);
        let conflicts = check(&candidate, &others, 5.0, 0.5, t(0), t(1));
        assert_eq!(conflicts.len(), 2);
    }

    #[test]
    fn symmetry_up_to_role_swap() {
        let d1 = trajectory::generate(
            "D1",
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(50.0, 0.0, 10.0)],
            t(0),
            t(60),
            1.0,
        )
        .unwrap();
        let d2 = trajectory::generate(
            "D2",
            Position::new(50.0, 0.0, 10.0),
            &[Position::new(0.0, 0.0, 10.0)],
            t(0),
            t(60),
            1.0,
        )
        .unwrap();

        let mut only_d2 = HashMap::new();
        only_d2.insert("D2".to_string(), d2.clone());
        let mut only_d1 = HashMap::new();
        only_d1.insert("D1".to_string(), d1.clone());

        let a_vs_b = check(&d1, &only_d2, 5.0, 0.5, t(0), t(60));
        let b_vs_a = check(&d2, &only_d1, 5.0, 0.5, t(0), t(60));
        assert_eq!(a_vs_b.len(), b_vs_a.len());
    }

    #[test]
    fn other_samples_outside_candidate_window_are_excluded_from_alignment() {
        // D1's candidate window is [t(0), t(10)]. D2's committed trajectory
        // overlaps that window (so the store hands it to the coordinator)
        // but its only sample close enough in time and distance to align
        // lies just after D1's end_time. Per §4.3's exclusion clause that
        // sample must not be used, even though it is within the
        // time-alignment tolerance of D1's last sample.
        let candidate = trajectory::Trajectory::new(vec![
            TrajectoryPoint {
                drone_id: "D1".into(),
                timestamp: t(0),
                position: Position::new(0.0, 0.0, 0.0),
                segment_index: 0,
                is_waypoint: false,
                mission_id: None,
            },
            TrajectoryPoint {
                drone_id: "D1".into(),
                timestamp: t(10),
                position: Position::new(0.0, 0.0, 0.0),
                segment_index: 0,
                is_waypoint: true,
                mission_id: None,
            },
        ]);
        let other = trajectory::Trajectory::new(vec![
            TrajectoryPoint {
                drone_id: "D2".into(),
                timestamp: t(5),
                position: Position::new(100.0, 0.0, 0.0),
                segment_index: 0,
                is_waypoint: false,
                mission_id: None,
            },
            TrajectoryPoint {
                drone_id: "D2".into(),
                timestamp: t(10) + chrono::Duration::milliseconds(300),
                position: Position::new(0.0, 0.0, 0.0),
                segment_index: 0,
                is_waypoint: true,
                mission_id: None,
            },
        ]);
        let mut others = HashMap::new();
        others.insert("D2".to_string(), other);

        let conflicts = check(&candidate, &others, 5.0, 0.5, t(0), t(10));
        assert!(
            conflicts.is_empty(),
            "D2's only close sample lies 300ms after D1's end_time, outside D1's [t(0), t(10)] window"
        );
    }
}
