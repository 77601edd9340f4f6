//! The C6 realtime proximity monitor: a pure step function over a snapshot
//! of current drone positions, plus the per-pair hysteresis state machine
//! (§4.6). The actual poll loop (Δ_poll cadence, cancellation) is owned by
//! the process supervisor in the server binary; this crate only supplies
//! the logic that runs on each tick, so it can be driven deterministically
//! in tests without a real clock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Position;
use crate::trajectory::DroneId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityAlert {
    pub time: DateTime<Utc>,
    pub drone_a: DroneId,
    pub drone_b: DroneId,
    pub distance: f64,
    pub position: Position,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    Clear,
    Approaching,
    Critical,
}

/// Tracks the hysteresis state machine for every drone pair that has ever
/// been observed, so `CLEAR -> CLEAR` transitions never emit chatter.
#[derive(Debug, Default)]
pub struct ProximityMonitor {
    safety_buffer: f64,
    hysteresis: f64,
    pair_states: HashMap<(DroneId, DroneId), PairState>,
}

fn pair_key(a: &str, b: &str) -> (DroneId, DroneId) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl ProximityMonitor {
    pub fn new(safety_buffer: f64, hysteresis: f64) -> Self {
        Self {
            safety_buffer,
            hysteresis,
            pair_states: HashMap::new(),
        }
    }

    fn severity_for(&self, distance: f64) -> Severity {
        if distance < 0.5 * self.safety_buffer {
            Severity::High
        } else if distance < 0.75 * self.safety_buffer {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    fn next_state(&self, current: PairState, distance: f64) -> PairState {
        let clear_threshold = self.safety_buffer * (1.0 + self.hysteresis);
        match current {
            PairState::Clear => {
                if distance < self.safety_buffer {
                    PairState::Approaching
                } else {
                    PairState::Clear
                }
            }
            PairState::Approaching => {
                if distance < 0.5 * self.safety_buffer {
                    PairState::Critical
                } else if distance > clear_threshold {
                    PairState::Clear
                } else {
                    PairState::Approaching
                }
            }
            PairState::Critical => {
                if distance > clear_threshold {
                    PairState::Clear
                } else {
                    PairState::Critical
                }
            }
        }
    }

    /// One polling tick: compute every pairwise distance in `positions` and
    /// emit an alert for each pair whose state transitioned.
    pub fn poll_once(
        &mut self,
        now: DateTime<Utc>,
        positions: &HashMap<DroneId, Position>,
    ) -> Vec<ProximityAlert> {
        let mut alerts = Vec::new();
        let ids: Vec<&DroneId> = positions.keys().collect();

        for i in 0..ids.len() {
            for j in (i + 1)..ids.len() {
                let (a, b) = (ids[i], ids[j]);
                let pos_a = positions[a];
                let pos_b = positions[b];
                let distance = pos_a.distance(&pos_b);

                let key = pair_key(a, b);
                let current = *self.pair_states.get(&key).unwrap_or(&PairState::Clear);
                let next = self.next_state(current, distance);

                if next != current {
                    if next != PairState::Clear {
                        alerts.push(ProximityAlert {
                            time: now,
                            drone_a: a.clone(),
                            drone_b: b.clone(),
                            distance,
                            position: pos_a.midpoint(&pos_b),
                            severity: self.severity_for(distance),
                        });
                    }
                    self.pair_states.insert(key, next);
                }
            }
        }

        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(offset_s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_s, 0).unwrap()
    }

    fn positions(a: f64) -> HashMap<DroneId, Position> {
        let mut m = HashMap::new();
        m.insert("A".to_string(), Position::new(0.0, 0.0, 0.0));
        m.insert("B".to_string(), Position::new(a, 0.0, 0.0));
        m
    }

    #[test]
    fn no_alert_when_clear() {
        let mut monitor = ProximityMonitor::new(5.0, 0.1);
        let alerts = monitor.poll_once(t(0), &positions(10.0));
        assert!(alerts.is_empty());
    }

    #[test]
    fn hysteresis_prevents_chatter_across_a_full_cycle() {
        let mut monitor = ProximityMonitor::new(5.0, 0.1);

        // Approach into APPROACHING (below buffer, above half-buffer).
        let a1 = monitor.poll_once(t(0), &positions(4.0));
        assert_eq!(a1.len(), 1, "CLEAR -> APPROACHING");

        // Continue approaching into CRITICAL (0.4*buffer = 2.0m).
        let a2 = monitor.poll_once(t(1), &positions(2.0));
        assert_eq!(a2.len(), 1, "APPROACHING -> CRITICAL");
        assert_eq!(a2[0].severity, Severity::High);

        // Separate to 1.05*buffer = 5.25m (above the hysteresis threshold).
        let a3 = monitor.poll_once(t(2), &positions(5.25));
        assert!(a3.is_empty(), "transition to CLEAR emits no alert");

        // Approach again.
        let a4 = monitor.poll_once(t(3), &positions(4.0));
        assert_eq!(a4.len(), 1, "CLEAR -> APPROACHING again");
    }

    #[test]
    fn distance_just_below_clear_threshold_does_not_clear() {
        let mut monitor = ProximityMonitor::new(5.0, 0.1);
        monitor.poll_once(t(0), &positions(4.0));
        monitor.poll_once(t(1), &positions(2.0));
        let alerts = monitor.poll_once(t(2), &positions(5.0));
        assert!(alerts.is_empty(), "5.0 < 5.0*1.1, still CRITICAL, no re-alert");
    }

    #[test]
    fn severity_bands() {
        let monitor = ProximityMonitor::new(10.0, 0.1);
        assert_eq!(monitor.severity_for(4.0), Severity::High);
        assert_eq!(monitor.severity_for(7.0), Severity::Medium);
        assert_eq!(monitor.severity_for(9.0), Severity::Low);
    }
}
