//! aukpad - shared-text pad server.

use aukpad::cache::Cache;
use aukpad::config::Config;
use aukpad::state::{AppState, spawn_sweeper};
use aukpad::{http, metrics, network};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Optional config file, then the environment on top.
    let config_path = std::env::args().nth(1);
    let config = Config::resolve(config_path.as_deref()).map_err(|e| {
        error!(path = ?config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(
        listen = %config.server.listen,
        cache = config.cache.enabled,
        max_text_bytes = config.limits.max_text_bytes,
        max_connections_per_ip = config.limits.max_connections_per_ip,
        retention_hours = config.retention.hours,
        "Starting aukpad"
    );

    // Convention: metrics_port = 0 disables metrics and the ops listener (used by tests).
    let metrics_port = config.server.metrics_port;
    if metrics_port != 0 {
        metrics::init();
    }

    let cache = Cache::from_config(&config.cache, config.retention.window()).await;
    let listen = config.server.listen;
    let state = AppState::new(config, cache);

    spawn_sweeper(state.clone());
    info!("Retention sweeper started");

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let ops = if metrics_port == 0 {
        info!("Metrics disabled");
        None
    } else {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                let shutdown = async move {
                    let _ = shutdown_rx.wait_for(|stopping| *stopping).await;
                };
                Some(tokio::spawn(http::serve_ops(listener, state.clone(), shutdown)))
            }
            Err(e) => {
                warn!(%addr, error = %e, "Failed to bind ops listener, continuing without it");
                None
            }
        }
    };

    let listener = TcpListener::bind(listen).await?;
    let served = tokio::select! {
        result = network::serve(listener, state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    let _ = shutdown_tx.send(true);
    if let Some(ops) = ops {
        match ops.await {
            Ok(Err(e)) => error!(error = %e, "Ops listener failed"),
            Err(e) => error!(error = %e, "Ops listener task panicked"),
            Ok(Ok(())) => {}
        }
    }

    served?;
    Ok(())
}
