//! Network module.
//!
//! Contains the axum router, the WebSocket session loop, the wire protocol
//! and broadcast fan-out.

pub mod fanout;
pub mod protocol;
pub mod routes;
pub mod session;

use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

/// Build the public router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::new_pad).post(routes::create_pad))
        .route("/ws/:room", get(routes::ws_upgrade))
        .route("/:room/", get(routes::pad_page))
        .route("/:room/raw", get(routes::raw_text))
        .with_state(state)
}

/// Serve the public router on `listener` until the process stops.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Pad listener bound");
    }
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}
