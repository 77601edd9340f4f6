//! Operational endpoints: `GET /health` and `GET /ready`, reporting
//! background-loop staleness and database reachability, matching the shape
//! (not the domain) of the reference deployment's own health/readiness
//! surface (§6).

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// `(name, max_age_secs)` — a loop whose last tick is older than this is
/// reported unready.
const LOOP_LIMITS: [(&str, u64); 2] = [("gc", 900), ("proximity-monitor", 5)];

#[derive(Debug, Serialize)]
struct LoopStatus {
    name: &'static str,
    ok: bool,
    age_secs: u64,
    max_age_secs: u64,
    last_tick_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReadyResponse {
    ok: bool,
    db_ok: bool,
    loops_ok: bool,
    db_latency_ms: Option<u128>,
    loops: Vec<LoopStatus>,
    error: Option<String>,
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let mut loops = Vec::with_capacity(LOOP_LIMITS.len());
    let mut loops_ok = true;
    for (name, max_age_secs) in LOOP_LIMITS {
        let last_tick_secs = state.loop_last_tick_secs(name);
        let (ok, age_secs) = match last_tick_secs {
            Some(last) => {
                let age = now_secs.saturating_sub(last);
                (age <= max_age_secs, age)
            }
            None => (false, u64::MAX),
        };
        if !ok {
            loops_ok = false;
        }
        loops.push(LoopStatus {
            name,
            ok,
            age_secs,
            max_age_secs,
            last_tick_secs,
        });
    }

    let started_at = Instant::now();
    let result = tokio::time::timeout(
        Duration::from_millis(750),
        sqlx::query("SELECT 1").execute(state.database().pool()),
    )
    .await;
    let (db_ok, db_latency_ms, db_error) = match result {
        Ok(Ok(_)) => (true, Some(started_at.elapsed().as_millis()), None),
        Ok(Err(err)) => (
            false,
            Some(started_at.elapsed().as_millis()),
            Some(err.to_string()),
        ),
        Err(_) => (
            false,
            Some(started_at.elapsed().as_millis()),
            Some("database ping timed out".to_string()),
        ),
    };

    let ok = db_ok && loops_ok;
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let error = db_error.or_else(|| {
        (!loops_ok).then(|| {
            let stale = loops
                .iter()
                .filter(|l| !l.ok)
                .map(|l| l.name)
                .collect::<Vec<_>>()
                .join(",");
            format!("stale loops: {stale}")
        })
    });

    (
        status,
        Json(ReadyResponse {
            ok,
            db_ok,
            loops_ok,
            db_latency_ms,
            loops,
            error,
        }),
    )
}
