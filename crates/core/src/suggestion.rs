//! The C5 suggestion generator: turns a rejected submission's conflicts into
//! ranked, concrete alternative proposals. Performs no re-validation of its
//! own output — the client must resubmit (§4.5).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::ConflictReport;
use crate::geometry::Position;

const DEFAULT_TIME_SHIFT_MARGIN_S: i64 = 5;
const DEFAULT_ALTITUDE_INCREMENT_M: f64 = 10.0;
const SPEEDUP_MIN_DURATION_S: i64 = 10;
const SPEEDUP_COMPRESSION: f64 = 0.20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    TimeShift {
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    },
    AltitudeAdjustment {
        waypoints: Vec<Position>,
    },
    PathDeviation {
        waypoints: Vec<Position>,
        needs_confirmation: bool,
    },
    Speedup {
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    },
}

/// Produce, in priority order, the alternatives §4.5 lists for a non-empty
/// conflict report.
pub fn suggest(
    report: &ConflictReport,
    waypoints: &[Position],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    // 1. Time shift.
    let delay = (report.latest_time() - report.earliest_time())
        + Duration::seconds(DEFAULT_TIME_SHIFT_MARGIN_S);
    suggestions.push(Suggestion::TimeShift {
        new_start: start_time + delay,
        new_end: end_time + delay,
    });

    // 2. Altitude adjustment.
    let raised: Vec<Position> = waypoints
        .iter()
        .map(|w| Position::new(w.x, w.y, w.z + DEFAULT_ALTITUDE_INCREMENT_M))
        .collect();
    suggestions.push(Suggestion::AltitudeAdjustment { waypoints: raised });

    // 3. Path deviation: insert the centroid of the conflict positions as an
    // intermediate waypoint, only when there's a real path to deviate from.
    if waypoints.len() >= 2 {
        let centroid = centroid(&report.conflict_positions());
        let mut detoured = Vec::with_capacity(waypoints.len() + 1);
        detoured.push(waypoints[0]);
        detoured.push(centroid);
        detoured.extend_from_slice(&waypoints[1..]);
        suggestions.push(Suggestion::PathDeviation {
            waypoints: detoured,
            needs_confirmation: true,
        });
    }

    // 4. Speedup.
    let duration = end_time - start_time;
    if duration > Duration::seconds(SPEEDUP_MIN_DURATION_S) {
        let compressed = Duration::milliseconds(
            (duration.num_milliseconds() as f64 * (1.0 - SPEEDUP_COMPRESSION)) as i64,
        );
        suggestions.push(Suggestion::Speedup {
            new_start: start_time,
            new_end: start_time + compressed,
        });
    }

    suggestions
}

fn centroid(positions: &[Position]) -> Position {
    if positions.is_empty() {
        return Position::new(0.0, 0.0, 0.0);
    }
    let n = positions.len() as f64;
    let (sx, sy, sz) = positions
        .iter()
        .fold((0.0, 0.0, 0.0), |(sx, sy, sz), p| (sx + p.x, sy + p.y, sz + p.z));
    Position::new(sx / n, sy / n, sz / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::Conflict;

    fn t(offset_s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_s, 0).unwrap()
    }

    fn sample_report() -> ConflictReport {
        ConflictReport::new(vec![Conflict {
            time: t(30),
            drone_a: "D1".into(),
            drone_b: "D2".into(),
            position_a: Position::new(25.0, 0.0, 10.0),
            position_b: Position::new(25.0, 0.0, 10.0),
            distance: 0.0,
            safety_buffer: 5.0,
        }])
        .unwrap()
    }

    #[test]
    fn time_shift_is_first_and_at_least_margin() {
        let report = sample_report();
        let waypoints = vec![Position::new(0.0, 0.0, 10.0), Position::new(50.0, 0.0, 10.0)];
        let suggestions = suggest(&report, &waypoints, t(0), t(60));
        match &suggestions[0] {
            Suggestion::TimeShift { new_start, .. } => {
                assert!(*new_start - t(0) >= Duration::seconds(5));
            }
            _ => panic!("expected TimeShift first"),
        }
    }

    #[test]
    fn altitude_adjustment_raises_every_waypoint() {
        let report = sample_report();
        let waypoints = vec![Position::new(0.0, 0.0, 10.0), Position::new(50.0, 0.0, 10.0)];
        let suggestions = suggest(&report, &waypoints, t(0), t(60));
        let altitude = suggestions
            .iter()
            .find_map(|s| match s {
                Suggestion::AltitudeAdjustment { waypoints } => Some(waypoints.clone()),
                _ => None,
            })
            .unwrap();
        assert!(altitude.iter().all(|w| w.z == 20.0));
    }

    #[test]
    fn path_deviation_only_for_multi_waypoint_missions() {
        let report = sample_report();
        let single = vec![Position::new(0.0, 0.0, 10.0)];
        let suggestions = suggest(&report, &single, t(0), t(60));
        assert!(!suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::PathDeviation { .. })));
    }

    #[test]
    fn speedup_absent_for_short_missions() {
        let report = sample_report();
        let waypoints = vec![Position::new(0.0, 0.0, 10.0), Position::new(50.0, 0.0, 10.0)];
        let suggestions = suggest(&report, &waypoints, t(0), t(5));
        assert!(!suggestions
            .iter()
            .any(|s| matches!(s, Suggestion::Speedup { .. })));
    }

    #[test]
    fn speedup_compresses_window_by_20_percent() {
        let report = sample_report();
        let waypoints = vec![Position::new(0.0, 0.0, 10.0), Position::new(50.0, 0.0, 10.0)];
        let suggestions = suggest(&report, &waypoints, t(0), t(60));
        let (new_start, new_end) = suggestions
            .iter()
            .find_map(|s| match s {
                Suggestion::Speedup { new_start, new_end } => Some((*new_start, *new_end)),
                _ => None,
            })
            .unwrap();
        assert_eq!(new_start, t(0));
        assert_eq!((new_end - new_start).num_seconds(), 48);
    }

    #[test]
    fn wire_shape_tags_the_suggestion_kind() {
        let suggestion = Suggestion::AltitudeAdjustment {
            waypoints: vec![Position::new(0.0, 0.0, 20.0)],
        };
        let value = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(value["kind"], "altitude_adjustment");
    }
}
