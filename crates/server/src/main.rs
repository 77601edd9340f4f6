//! Deconfliction server - HTTP/websocket adapter around the spatial-temporal
//! deconfliction engine.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

use deconfliction_server::config::Config;
use deconfliction_server::state::live_state::InMemoryLiveState;
use deconfliction_server::state::AppState;
use deconfliction_server::{api, loops, persistence};
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let config = Config::from_env();
    if config.log_format.trim().eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    if let Err(err) = config.validate() {
        bail!("invalid configuration: {err}");
    }

    tracing::info!("starting deconfliction server");

    tracing::info!(path = %config.database_path, "initializing database");
    let db = persistence::init_database(&config.database_path, config.database_max_connections).await?;
    tracing::info!("database initialized");

    let live_state = Arc::new(InMemoryLiveState::new());
    for row in persistence::drones::load_all(db.pool()).await? {
        live_state.update(row.drone_id, row.position, row.last_seen);
    }

    let state = Arc::new(AppState::new(db.clone(), config.clone(), live_state));

    // Rehydrate the in-memory trajectory store from durable storage before
    // the coordinator accepts any submission (§10.4).
    for (drone_id, trajectory) in persistence::trajectories::load_all(db.pool()).await? {
        state.store().put(drone_id, trajectory, None);
    }
    tracing::info!("trajectory store rehydrated from database");

    let (shutdown_tx, _) = broadcast::channel(1);

    {
        let state = state.clone();
        spawn_supervised_loop("gc", shutdown_tx.clone(), move |shutdown| {
            loops::gc_loop::run(state.clone(), shutdown)
        });
    }
    {
        let state = state.clone();
        spawn_supervised_loop("proximity-monitor", shutdown_tx.clone(), move |shutdown| {
            loops::monitor_loop::run(state.clone(), shutdown)
        });
    }

    let app = api::routes().with_state(state);

    let app = if config.allowed_origins.is_empty() {
        tracing::warn!("no CORS origins configured - CORS disabled (same-origin only)");
        app
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        app.layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any),
        )
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to install SIGTERM handler (CTRL-C only)");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(());
}

#[cfg(not(unix))]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    let _ = shutdown_tx.send(());
}

/// Races a long-lived background role against a shutdown signal, restarting
/// it with a short fixed backoff if it exits unexpectedly or panics, and
/// stopping permanently once shutdown has been observed (§10.5). Shutdown
/// is checked with priority over a crashed-task restart so a shutdown
/// request is never starved by a restart loop.
fn spawn_supervised_loop<F, Fut>(name: &'static str, shutdown_tx: broadcast::Sender<()>, make_future: F)
where
    F: Fn(broadcast::Receiver<()>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();
        loop {
            let task_shutdown = shutdown_tx.subscribe();
            let handle = tokio::spawn(make_future(task_shutdown));
            tokio::pin!(handle);
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    handle.as_mut().abort();
                    break;
                }
                result = &mut handle => {
                    match result {
                        Ok(_) => tracing::warn!("{} loop exited unexpectedly", name),
                        Err(err) => tracing::error!("{} loop crashed: {}", name, err),
                    }
                }
            }

            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            tracing::warn!("restarting {} loop in 1s", name);
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    });
}
