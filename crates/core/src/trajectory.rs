//! TrajectoryPoint/Trajectory data model and the C1 trajectory generator.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DeconflictionError;
use crate::geometry::Position;

pub type DroneId = String;
pub type MissionId = String;

/// A single time-stamped sample of a drone's planned position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub drone_id: DroneId,
    pub timestamp: DateTime<Utc>,
    pub position: Position,
    /// Which inter-waypoint leg this sample belongs to.
    pub segment_index: usize,
    /// True iff this sample coincides with the endpoint of a leg.
    pub is_waypoint: bool,
    pub mission_id: Option<MissionId>,
}

/// A finite, time-sorted sequence of samples for a single drone. Strictly
/// monotone in timestamp (invariant 3 of the data model).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    /// Build a trajectory from already-ordered points. Debug-asserts
    /// monotonicity; callers (the generator, the store) are responsible for
    /// never constructing a trajectory that violates it.
    pub fn new(points: Vec<TrajectoryPoint>) -> Self {
        debug_assert!(
            points.windows(2).all(|w| w[0].timestamp < w[1].timestamp),
            "trajectory samples must be strictly increasing in timestamp"
        );
        Self { points }
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<TrajectoryPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn drone_id(&self) -> Option<&str> {
        self.points.first().map(|p| p.drone_id.as_str())
    }

    pub fn mission_id(&self) -> Option<&str> {
        self.points.first().and_then(|p| p.mission_id.as_deref())
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Stamp every sample with a mission id (done once a candidate is
    /// accepted and committed under that mission).
    pub fn with_mission_id(mut self, mission_id: MissionId) -> Self {
        for p in &mut self.points {
            p.mission_id = Some(mission_id.clone());
        }
        self
    }

    /// Drop samples older than `cutoff`, used by the store's `gc`.
    pub(crate) fn retain_from(&mut self, cutoff: DateTime<Utc>) {
        self.points.retain(|p| p.timestamp >= cutoff);
    }
}

/// Generate a dense 4D trajectory from an origin plus a waypoint list,
/// spread proportionally-by-distance across `[start_time, end_time]`.
///
/// See §4.1: constant-speed-per-leg allocation, samples spaced at
/// `time_resolution_s` seconds, with the terminal sample pinned exactly to
/// `end_time` to avoid floating-point drift.
pub fn generate(
    drone_id: &str,
    origin: Position,
    waypoints: &[Position],
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    time_resolution_s: f64,
) -> Result<Trajectory, DeconflictionError> {
    if end_time <= start_time {
        return Err(DeconflictionError::InvalidWindow);
    }
    if waypoints.is_empty() {
        return Err(DeconflictionError::EmptyWaypoints);
    }

    let mut path = Vec::with_capacity(waypoints.len() + 1);
    path.push(origin);
    path.extend_from_slice(waypoints);

    let leg_lengths: Vec<f64> = path.windows(2).map(|w| w[0].distance(&w[1])).collect();
    let total_length: f64 = leg_lengths.iter().sum();

    if total_length == 0.0 {
        let point = TrajectoryPoint {
            drone_id: drone_id.to_string(),
            timestamp: start_time,
            position: origin,
            segment_index: 0,
            is_waypoint: true,
            mission_id: None,
        };
        return Ok(Trajectory::new(vec![point]));
    }

    let window_s = (end_time - start_time).num_milliseconds() as f64 / 1000.0;
    let tau = time_resolution_s.max(1e-6);

    let mut samples = Vec::new();
    let mut leg_start_t = start_time;

    for (i, leg_len) in leg_lengths.iter().enumerate() {
        let is_last_leg = i == leg_lengths.len() - 1;
        let leg_window_s = window_s * leg_len / total_length;
        let leg_end_t = if is_last_leg {
            end_time
        } else {
            leg_start_t + Duration::milliseconds((leg_window_s * 1000.0).round() as i64)
        };

        let n_intervals = ((leg_window_s / tau).floor() as i64).max(1) as usize;
        let leg_from = path[i];
        let leg_to = path[i + 1];
        let leg_span_ms = (leg_end_t - leg_start_t).num_milliseconds() as f64;

        // Sample s=0 is the shared junction with the previous leg's final
        // sample; skip it for every leg after the first to keep timestamps
        // strictly increasing.
        let start_s = if i == 0 { 0 } else { 1 };
        for s in start_s..=n_intervals {
            let frac = s as f64 / n_intervals as f64;
            let position = leg_from.lerp(&leg_to, frac);
            let timestamp = if s == n_intervals {
                leg_end_t
            } else {
                leg_start_t + Duration::milliseconds((leg_span_ms * frac).round() as i64)
            };
            samples.push(TrajectoryPoint {
                drone_id: drone_id.to_string(),
                timestamp,
                position,
                segment_index: i,
                is_waypoint: s == n_intervals,
                mission_id: None,
            });
        }

        leg_start_t = leg_end_t;
    }

    if let Some(last) = samples.last_mut() {
        last.timestamp = end_time;
    }

    Ok(Trajectory::new(samples))
}
