//! Server configuration from environment (§10.3).
//!
//! Read once at process start and validated before the coordinator accepts
//! any submission; no global mutable config singleton — the value is passed
//! by reference into the state and adapters.

use std::env;

use deconfliction_core::EngineConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    pub log_format: String,
    pub allowed_origins: Vec<String>,
    /// Realtime proximity monitor poll cadence (Δ_poll, §4.6), seconds.
    pub poll_interval: f64,
    /// How long a committed trajectory's samples must all lie in the past
    /// before `gc` is allowed to drop them (invariant 5, §3).
    pub gc_grace_seconds: i64,
    pub engine: EngineConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let fleet_ids = env::var("DECONFLICTION_FLEET_IDS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let engine = EngineConfig {
            safety_buffer: env_or("DECONFLICTION_SAFETY_BUFFER", 5.0),
            time_resolution: env_or("DECONFLICTION_TIME_RESOLUTION", 0.1),
            time_alignment_tolerance: env_or("DECONFLICTION_TIME_ALIGNMENT_TOLERANCE", 0.5),
            lookahead: env_or("DECONFLICTION_LOOKAHEAD", 30.0),
            gc_interval: env_or("DECONFLICTION_GC_INTERVAL", 300.0),
            hysteresis: env_or("DECONFLICTION_HYSTERESIS", 0.10),
            lock_timeout: env_or("DECONFLICTION_LOCK_TIMEOUT", 30.0),
            fleet_ids,
        };

        Self {
            server_port: env_or("DECONFLICTION_PORT", 3000),
            database_path: env::var("DECONFLICTION_DATABASE_PATH")
                .unwrap_or_else(|_| "data/deconfliction.db".to_string()),
            database_max_connections: env_or("DECONFLICTION_DATABASE_MAX_CONNECTIONS", 5),
            log_format: env::var("DECONFLICTION_LOG_FORMAT").unwrap_or_default(),
            allowed_origins: env::var("DECONFLICTION_ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            poll_interval: env_or("DECONFLICTION_POLL_INTERVAL", 0.5),
            gc_grace_seconds: env_or("DECONFLICTION_GC_GRACE_SECONDS", 3600),
            engine,
        }
    }

    /// Reject a configuration that would make the rest of the server behave
    /// nonsensically rather than defaulting silently into an invalid state.
    pub fn validate(&self) -> Result<(), String> {
        self.engine.validate()?;
        if self.poll_interval <= 0.0 {
            return Err("poll_interval must be positive".into());
        }
        if self.gc_grace_seconds < 0 {
            return Err("gc_grace_seconds must not be negative".into());
        }
        if self.database_max_connections == 0 {
            return Err("database_max_connections must be positive".into());
        }
        Ok(())
    }
}
