//! Test server management.
//!
//! Runs the pad router inside the test's own runtime on 127.0.0.1:0.

use aukpad::cache::Cache;
use aukpad::config::Config;
use aukpad::network;
use aukpad::state::AppState;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A test server instance.
pub struct TestServer {
    addr: SocketAddr,
    state: AppState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn a server with default limits and no cache.
    #[allow(dead_code)]
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(Config::default(), Cache::disabled()).await
    }

    /// Spawn a server with the given configuration and cache.
    pub async fn spawn_with(config: Config, cache: Cache) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = AppState::new(config, cache);

        let served = state.clone();
        let handle = tokio::spawn(async move {
            let _ = network::serve(listener, served).await;
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// Get the server address.
    #[allow(dead_code)]
    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    /// Shared state, for inspecting the registry and limiters.
    #[allow(dead_code)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Absolute HTTP URL for `path` (which must start with `/`).
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Open a WebSocket session on `room` and consume its init frame.
    #[allow(dead_code)]
    pub async fn join(&self, room: &str) -> anyhow::Result<(super::TestClient, String, u64)> {
        let mut client = self.connect(room).await?;
        let (text, ver) = client.recv_init().await?;
        Ok((client, text, ver))
    }

    /// Open a WebSocket session on `room` without reading anything.
    pub async fn connect(&self, room: &str) -> anyhow::Result<super::TestClient> {
        super::TestClient::connect(&format!("ws://{}/ws/{}", self.addr, room)).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
