//! Test WebSocket client.
//!
//! Sends edits and asserts on the JSON frames the server pushes back.

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

static NEXT_CLIENT: AtomicU64 = AtomicU64::new(1);

/// A test pad client.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    client_id: String,
}

impl TestClient {
    /// Connect to a pad WebSocket endpoint.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        let (ws, _) = connect_async(url).await?;
        let client_id = format!("client-{}", NEXT_CLIENT.fetch_add(1, Ordering::Relaxed));
        Ok(Self { ws, client_id })
    }

    /// The opaque id this client stamps on its edits.
    #[allow(dead_code)]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Send a raw frame.
    pub async fn send_raw(&mut self, message: Message) -> anyhow::Result<()> {
        self.ws.send(message).await?;
        Ok(())
    }

    /// Send an edit replacing the whole text.
    #[allow(dead_code)]
    pub async fn edit(&mut self, text: &str) -> anyhow::Result<()> {
        let frame = json!({"type": "edit", "ver": 0, "text": text, "clientId": self.client_id});
        self.send_raw(Message::Text(frame.to_string())).await
    }

    /// Receive the next JSON frame.
    pub async fn recv(&mut self) -> anyhow::Result<Value> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive the next JSON frame with a timeout, skipping control frames.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Value> {
        loop {
            let next = timeout(dur, self.ws.next()).await?;
            match next {
                Some(Ok(Message::Text(raw))) => return Ok(serde_json::from_str(&raw)?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(other)) => anyhow::bail!("unexpected frame: {other:?}"),
                Some(Err(e)) => return Err(e.into()),
                None => anyhow::bail!("connection closed"),
            }
        }
    }

    /// Receive the init frame and return its text and version.
    pub async fn recv_init(&mut self) -> anyhow::Result<(String, u64)> {
        let frame = self.recv().await?;
        anyhow::ensure!(frame["type"] == "init", "expected init, got {frame}");
        let text = frame["text"].as_str().unwrap_or_default().to_string();
        let ver = frame["ver"].as_u64().unwrap_or_default();
        Ok((text, ver))
    }

    /// True if no text frame arrives within `dur`.
    #[allow(dead_code)]
    pub async fn is_quiet(&mut self, dur: Duration) -> bool {
        self.recv_timeout(dur).await.is_err()
    }

    /// Read until the server closes, returning its close frame if any.
    #[allow(dead_code)]
    pub async fn recv_close(&mut self) -> anyhow::Result<Option<CloseFrame<'static>>> {
        loop {
            match timeout(Duration::from_secs(5), self.ws.next()).await? {
                Some(Ok(Message::Close(frame))) => return Ok(frame),
                Some(Ok(_)) => continue,
                Some(Err(_)) | None => return Ok(None),
            }
        }
    }

    /// Close the session from the client side.
    #[allow(dead_code)]
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
