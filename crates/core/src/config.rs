//! Engine-wide tunables (§6 of the design spec). Passed by value into the
//! coordinator and adapters; there is no global mutable config singleton.

use serde::{Deserialize, Serialize};

/// Tunables shared by every component in this crate. Defaults match §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum safe Euclidean distance (m).
    pub safety_buffer: f64,
    /// Inter-sample interval in generated trajectories (s).
    pub time_resolution: f64,
    /// Max time delta for matching samples in conflict check (s).
    pub time_alignment_tolerance: f64,
    /// Horizon for the realtime monitor (s).
    pub lookahead: f64,
    /// Periodic store garbage-collection cadence (s).
    pub gc_interval: f64,
    /// Clearance ratio above buffer before returning to CLEAR.
    pub hysteresis: f64,
    /// Busy-wait bound on acquiring the store's write lock (s, §5).
    pub lock_timeout: f64,
    /// The recognized drone identities.
    pub fleet_ids: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            safety_buffer: 5.0,
            time_resolution: 0.1,
            time_alignment_tolerance: 0.5,
            lookahead: 30.0,
            gc_interval: 300.0,
            hysteresis: 0.10,
            lock_timeout: 30.0,
            fleet_ids: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations that would make the rest of the crate behave
    /// nonsensically rather than defaulting silently into an invalid state.
    pub fn validate(&self) -> Result<(), String> {
        if self.safety_buffer <= 0.0 {
            return Err("safety_buffer must be positive".into());
        }
        if self.time_resolution <= 0.0 {
            return Err("time_resolution must be positive".into());
        }
        if self.time_alignment_tolerance < 0.0 {
            return Err("time_alignment_tolerance must not be negative".into());
        }
        if self.lookahead <= 0.0 {
            return Err("lookahead must be positive".into());
        }
        if self.gc_interval <= 0.0 {
            return Err("gc_interval must be positive".into());
        }
        if self.hysteresis < 0.0 {
            return Err("hysteresis must not be negative".into());
        }
        if self.lock_timeout <= 0.0 {
            return Err("lock_timeout must be positive".into());
        }
        Ok(())
    }

    pub fn is_known_drone(&self, drone_id: &str) -> bool {
        self.fleet_ids.is_empty() || self.fleet_ids.iter().any(|id| id == drone_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.safety_buffer, 5.0);
        assert_eq!(cfg.time_resolution, 0.1);
        assert_eq!(cfg.time_alignment_tolerance, 0.5);
        assert_eq!(cfg.lookahead, 30.0);
        assert_eq!(cfg.gc_interval, 300.0);
        assert_eq!(cfg.hysteresis, 0.10);
        assert_eq!(cfg.lock_timeout, 30.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_safety_buffer() {
        let mut cfg = EngineConfig::default();
        cfg.safety_buffer = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_fleet_ids_means_unrestricted() {
        let cfg = EngineConfig::default();
        assert!(cfg.is_known_drone("D1"));
    }
}
