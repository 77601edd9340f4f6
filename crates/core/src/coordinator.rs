//! The C4 deconfliction coordinator: orchestrates generate →
//! check-against-store → commit-or-reject under the store's single-writer
//! lock (§4.4). This is the one place the core's components are wired
//! together; there is no ambient global coordinator instance — one value is
//! constructed at startup and handed to every request handler (§9).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::conflict::{self, ConflictReport};
use crate::config::EngineConfig;
use crate::decision::Decision;
use crate::error::DeconflictionError;
use crate::geometry::Position;
use crate::live_state::LiveStateSource;
use crate::store::TrajectoryStore;
use crate::suggestion;
use crate::trajectory::{self, DroneId};

pub struct Coordinator {
    store: Arc<TrajectoryStore>,
    live_state: Arc<dyn LiveStateSource>,
    config: EngineConfig,
}

impl Coordinator {
    pub fn new(
        store: Arc<TrajectoryStore>,
        live_state: Arc<dyn LiveStateSource>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            live_state,
            config,
        }
    }

    pub fn store(&self) -> &Arc<TrajectoryStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Implements §4.4's atomic algorithm end to end.
    pub async fn submit(
        &self,
        drone_id: DroneId,
        waypoints: Vec<Position>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Decision, DeconflictionError> {
        if !self.config.is_known_drone(&drone_id) {
            tracing::debug!(drone_id = %drone_id, "submit rejected: unrecognized drone");
            return Err(DeconflictionError::UnknownDrone(drone_id));
        }

        // Step 1: resolve current position. No position on record means the
        // drone is disconnected; reject rather than guess an origin (Open
        // Question, resolved — see DESIGN.md).
        let origin = self
            .live_state
            .current_position(&drone_id)
            .await
            .ok_or_else(|| {
                tracing::debug!(drone_id = %drone_id, "submit rejected: no live position on record");
                DeconflictionError::UnknownDrone(drone_id.clone())
            })?;

        // Step 2: generate the candidate trajectory.
        let candidate = trajectory::generate(
            &drone_id,
            origin,
            &waypoints,
            start_time,
            end_time,
            self.config.time_resolution,
        )?;

        // Steps 3-5: atomic check-and-commit under the store's write lock.
        let lock_timeout = Duration::from_secs_f64(self.config.lock_timeout);
        let session = self.store.begin_commit(lock_timeout).await?;
        let others = session.query_others(&drone_id, start_time, end_time);
        let conflicts = conflict::check(
            &candidate,
            &others,
            self.config.safety_buffer,
            self.config.time_alignment_tolerance,
            start_time,
            end_time,
        );

        if conflicts.is_empty() {
            let mission_id = Uuid::new_v4().to_string();
            tracing::debug!(drone_id = %drone_id, mission_id = %mission_id, "candidate trajectory clear, committing");
            session.commit(
                drone_id,
                candidate.with_mission_id(mission_id.clone()),
                mission_id.clone(),
            );
            return Ok(Decision::Accepted { mission_id });
        }
        drop(session);

        tracing::debug!(drone_id = %drone_id, conflict_count = conflicts.len(), "candidate trajectory conflicts, rejecting");
        let report = ConflictReport::new(conflicts.clone())
            .expect("conflicts is non-empty on this branch");
        let suggestions = suggestion::suggest(&report, &waypoints, start_time, end_time);
        Ok(Decision::Rejected {
            conflicts,
            suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct FakeLiveState {
        positions: RwLock<HashMap<String, Position>>,
    }

    impl FakeLiveState {
        fn new(positions: &[(&str, Position)]) -> Self {
            Self {
                positions: RwLock::new(
                    positions
                        .iter()
                        .map(|(id, pos)| (id.to_string(), *pos))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait::async_trait]
    impl LiveStateSource for FakeLiveState {
        async fn current_position(&self, drone_id: &str) -> Option<Position> {
            self.positions.read().await.get(drone_id).copied()
        }

        async fn all_positions(&self) -> HashMap<String, Position> {
            self.positions.read().await.clone()
        }
    }

    fn t(offset_s: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_s, 0).unwrap()
    }

    fn coordinator(live_state: FakeLiveState) -> Coordinator {
        Coordinator::new(
            Arc::new(TrajectoryStore::new()),
            Arc::new(live_state),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn clear_airspace_accepts() {
        let coordinator = coordinator(FakeLiveState::new(&[("D1", Position::new(0.0, 0.0, 10.0))]));
        let decision = coordinator
            .submit(
                "D1".into(),
                vec![Position::new(50.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap();
        assert!(decision.is_accepted());

        let found = coordinator.store().query(t(0), t(60));
        let traj = &found["D1"];
        assert_eq!(traj.points().first().unwrap().position, Position::new(0.0, 0.0, 10.0));
        assert_eq!(traj.points().last().unwrap().position, Position::new(50.0, 0.0, 10.0));
    }

    #[tokio::test]
    async fn head_on_mission_is_rejected_with_suggestions() {
        let coordinator = coordinator(FakeLiveState::new(&[
            ("D1", Position::new(0.0, 0.0, 10.0)),
            ("D2", Position::new(50.0, 0.0, 10.0)),
        ]));
        coordinator
            .submit(
                "D1".into(),
                vec![Position::new(50.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap();

        let decision = coordinator
            .submit(
                "D2".into(),
                vec![Position::new(0.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap();

        match decision {
            Decision::Rejected {
                conflicts,
                suggestions,
            } => {
                assert!(!conflicts.is_empty());
                assert!(!suggestions.is_empty());
            }
            Decision::Accepted { .. } => panic!("expected a rejection"),
        }
    }

    #[tokio::test]
    async fn altitude_separation_succeeds() {
        let coordinator = coordinator(FakeLiveState::new(&[
            ("D1", Position::new(0.0, 0.0, 10.0)),
            ("D2", Position::new(50.0, 0.0, 25.0)),
        ]));
        coordinator
            .submit(
                "D1".into(),
                vec![Position::new(50.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap();
        let decision = coordinator
            .submit(
                "D2".into(),
                vec![Position::new(0.0, 0.0, 25.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap();
        assert!(decision.is_accepted());
    }

    #[tokio::test]
    async fn disconnected_drone_is_rejected() {
        let coordinator = coordinator(FakeLiveState::new(&[]));
        let err = coordinator
            .submit(
                "D1".into(),
                vec![Position::new(50.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeconflictionError::UnknownDrone(_)));
    }

    #[tokio::test]
    async fn concurrent_conflicting_submissions_accept_exactly_one() {
        let coordinator = Arc::new(coordinator(FakeLiveState::new(&[
            ("D3", Position::new(0.0, 0.0, 10.0)),
            ("D4", Position::new(50.0, 0.0, 10.0)),
        ])));

        let c1 = coordinator.clone();
        let c2 = coordinator.clone();
        let h1 = tokio::spawn(async move {
            c1.submit(
                "D3".into(),
                vec![Position::new(50.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
        });
        let h2 = tokio::spawn(async move {
            c2.submit(
                "D4".into(),
                vec![Position::new(0.0, 0.0, 10.0)],
                t(0),
                t(60),
            )
            .await
        });

        let (r1, r2) = tokio::join!(h1, h2);
        let accepted = [r1.unwrap().unwrap(), r2.unwrap().unwrap()]
            .into_iter()
            .filter(|d| d.is_accepted())
            .count();
        assert_eq!(accepted, 1);
    }
}
