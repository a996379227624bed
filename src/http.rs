//! Operator HTTP listener.
//!
//! Serves `/metrics` for Prometheus and `/healthz` for probes on a port of
//! its own, so it can stay private while the pad listener is public. It
//! shares [`AppState`] with the pad router and stops with it.

use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Body of `GET /healthz`.
#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    rooms: usize,
    connected_addresses: usize,
    cache: &'static str,
}

async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        rooms: state.registry.len(),
        connected_addresses: state.connections.tracked_addresses(),
        cache: state.registry.cache().backend_name(),
    })
}

/// Build the operator router.
pub fn ops_router(state: AppState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(health_handler))
        .with_state(state)
}

/// Serve the operator router until `shutdown` resolves.
pub async fn serve_ops<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Ops listener bound");
    }
    axum::serve(listener, ops_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
