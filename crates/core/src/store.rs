//! The C2 trajectory store: a concurrently-accessed keyed store of each
//! drone's committed future trajectory, with an atomic check-and-commit
//! contract (§4.2, §5).
//!
//! The fast path is a [`DashMap`] keyed by `drone_id`, mirroring the
//! reference deployment's own `AppState` — a single `put` replaces one
//! entry atomically, so ordinary readers never observe a torn write.
//! Serializing the *check-then-commit* sequence across concurrent
//! submissions additionally needs a single-writer lock; `CommitSession`
//! holds that lock for its lifetime, exactly the role the reference
//! deployment's `flight_plan_booking_lock` plays for flight-plan booking.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::DeconflictionError;
use crate::trajectory::{DroneId, MissionId, Trajectory};

#[derive(Debug, Default)]
pub struct TrajectoryStore {
    trajectories: DashMap<DroneId, Trajectory>,
    mission_index: DashMap<MissionId, DroneId>,
    write_lock: std::sync::Arc<Mutex<()>>,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All committed samples of all drones whose trajectory overlaps
    /// `[start, end]`.
    pub fn query(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> HashMap<DroneId, Trajectory> {
        self.query_excluding(None, start, end)
    }

    fn query_excluding(
        &self,
        exclude: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> HashMap<DroneId, Trajectory> {
        let mut out = HashMap::new();
        for entry in self.trajectories.iter() {
            let drone_id = entry.key();
            if exclude.is_some_and(|ex| ex == drone_id) {
                continue;
            }
            let traj = entry.value();
            let overlaps = match (traj.start_time(), traj.end_time()) {
                (Some(s), Some(e)) => s <= end && e >= start,
                _ => false,
            };
            if overlaps {
                out.insert(drone_id.clone(), traj.clone());
            }
        }
        out
    }

    /// Atomically replace any existing committed trajectory for this drone.
    /// Used outside a [`CommitSession`] by callers that don't need the
    /// check-then-commit atomicity (e.g. rehydrating from durable storage at
    /// startup).
    pub fn put(&self, drone_id: DroneId, trajectory: Trajectory, mission_id: Option<MissionId>) {
        if let Some(mission_id) = mission_id {
            self.mission_index.insert(mission_id, drone_id.clone());
        }
        self.trajectories.insert(drone_id, trajectory);
    }

    pub fn forget(&self, drone_id: &str) {
        self.trajectories.remove(drone_id);
        self.mission_index.retain(|_, d| d != drone_id);
    }

    pub fn forget_mission(&self, mission_id: &str) {
        if let Some((_, drone_id)) = self.mission_index.remove(mission_id) {
            self.trajectories.remove(&drone_id);
        }
    }

    /// Every drone with a committed trajectory, used by wildcard emergency
    /// clear (§6).
    pub fn drone_ids(&self) -> Vec<DroneId> {
        self.trajectories
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Delete committed samples older than `cutoff`; drops a drone's entry
    /// entirely once it has none left (invariant 5).
    pub fn gc(&self, cutoff: DateTime<Utc>) {
        self.trajectories.retain(|_, traj| {
            traj.retain_from(cutoff);
            !traj.is_empty()
        });
        self.mission_index
            .retain(|_, drone_id| self.trajectories.contains_key(drone_id));
    }

    /// Acquire the store's single-writer lock for the duration of a
    /// check-then-commit sequence (§4.4 steps 3-5). Waits for any other
    /// in-flight commit session to complete, bounded by `lock_timeout`; past
    /// that bound, returns `StoreBusy` rather than blocking indefinitely
    /// (§5: "busy-wait bounded by a timeout, default 30 s").
    pub async fn begin_commit(
        &self,
        lock_timeout: Duration,
    ) -> Result<CommitSession<'_>, DeconflictionError> {
        let started = std::time::Instant::now();
        match tokio::time::timeout(lock_timeout, self.write_lock.clone().lock_owned()).await {
            Ok(guard) => Ok(CommitSession {
                store: self,
                _guard: guard,
            }),
            Err(_) => Err(DeconflictionError::StoreBusy(started.elapsed())),
        }
    }
}

/// The atomic unit described in §4.4 steps 3-5: query, detect, and
/// conditionally commit, all under one held lock.
pub struct CommitSession<'a> {
    store: &'a TrajectoryStore,
    _guard: OwnedMutexGuard<()>,
}

impl<'a> CommitSession<'a> {
    /// All other drones' trajectories overlapping `[start, end]`, excluding
    /// the submitting drone's own prior commitment.
    pub fn query_others(
        &self,
        submitting_drone_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> HashMap<DroneId, Trajectory> {
        self.store
            .query_excluding(Some(submitting_drone_id), start, end)
    }

    /// Commit the candidate trajectory. Only call this once the caller has
    /// confirmed the conflict list is empty.
    pub fn commit(&self, drone_id: DroneId, trajectory: Trajectory, mission_id: MissionId) {
        self.store.put(drone_id, trajectory, Some(mission_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;
    use crate::trajectory;

    fn t(offset_s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_s, 0).unwrap()
    }

    fn sample_trajectory(drone_id: &str) -> Trajectory {
        trajectory::generate(
            drone_id,
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(50.0, 0.0, 10.0)],
            t(0),
            t(60),
            0.1,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn round_trip_put_then_query() {
        let store = TrajectoryStore::new();
        let traj = sample_trajectory("D1");
        store.put("D1".into(), traj.clone(), None);
        let found = store.query(t(0), t(60));
        assert_eq!(found.len(), 1);
        assert_eq!(found["D1"].points(), traj.points());
    }

    #[tokio::test]
    async fn idempotent_put() {
        let store = TrajectoryStore::new();
        let traj = sample_trajectory("D1");
        store.put("D1".into(), traj.clone(), None);
        store.put("D1".into(), traj.clone(), None);
        assert_eq!(store.query(t(0), t(60)).len(), 1);
    }

    #[tokio::test]
    async fn query_excludes_non_overlapping_drones() {
        let store = TrajectoryStore::new();
        store.put("D1".into(), sample_trajectory("D1"), None);
        let later = trajectory::generate(
            "D2",
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(10.0, 0.0, 10.0)],
            t(1000),
            t(1060),
            0.1,
        )
        .unwrap();
        store.put("D2".into(), later, None);
        let found = store.query(t(0), t(60));
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("D1"));
    }

    #[tokio::test]
    async fn gc_removes_expired_trajectories() {
        let store = TrajectoryStore::new();
        let past = trajectory::generate(
            "D1",
            Position::new(0.0, 0.0, 10.0),
            &[Position::new(10.0, 0.0, 10.0)],
            t(-7200),
            t(-7140),
            0.1,
        )
        .unwrap();
        store.put("D1".into(), past, None);
        store.gc(t(0));
        assert!(store.query(t(-7200), t(-7140)).is_empty());
    }

    #[tokio::test]
    async fn commit_session_excludes_submitting_drone() {
        let store = TrajectoryStore::new();
        store.put("D1".into(), sample_trajectory("D1"), None);
        let session = store.begin_commit(Duration::from_secs(30)).await.unwrap();
        let others = session.query_others("D1", t(0), t(60));
        assert!(others.is_empty());
    }

    #[tokio::test]
    async fn begin_commit_times_out_when_lock_is_held() {
        let store = TrajectoryStore::new();
        let held = store.begin_commit(Duration::from_secs(30)).await.unwrap();

        let err = store
            .begin_commit(Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::DeconflictionError::StoreBusy(_)));

        drop(held);
    }

    #[tokio::test]
    async fn forget_mission_removes_the_owning_drones_trajectory() {
        let store = TrajectoryStore::new();
        store.put("D1".into(), sample_trajectory("D1"), Some("M1".into()));
        store.forget_mission("M1");
        assert!(store.query(t(0), t(60)).is_empty());
    }
}
