//! Integration test common infrastructure.
//!
//! Provides an in-process pad server bound to an ephemeral port, a
//! WebSocket test client that speaks the pad protocol, and a scripted
//! cache server for backend failure modes.

pub mod client;
pub mod server;
pub mod valkey;

#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::TestServer;

use std::future::Future;
use std::time::Duration;

/// Poll `check` until it returns true or two seconds pass.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
