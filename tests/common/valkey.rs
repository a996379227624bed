//! Scripted stand-in for a Valkey/Redis server.
//!
//! Speaks just enough RESP for the cache backend: `PING`, `GET` (always a
//! miss), `EVALSHA` and a plain `+OK` for everything else. The behavior after
//! the connection's `PING` is what each test chooses.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Accept connections and never answer anything.
    Silent,
    /// Answer the handshake and `PING`, then keep the socket open and silent.
    StallAfterPing,
    /// Answer everything, but close the first connection right after its `PING`.
    DropFirstAfterPing,
}

pub struct FakeValkey {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl FakeValkey {
    pub async fn start(behavior: Behavior) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        let handle = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
                tokio::spawn(serve_connection(socket, behavior, first));
            }
        });

        Ok(Self {
            addr,
            accepted,
            handle,
        })
    }

    pub fn url(&self) -> String {
        format!("redis://{}/0", self.addr)
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for FakeValkey {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_connection(socket: TcpStream, behavior: Behavior, first: bool) {
    let (read, mut write) = socket.into_split();
    let mut reader = BufReader::new(read);
    if behavior == Behavior::Silent {
        drain(&mut reader).await;
        return;
    }

    while let Some(command) = read_command(&mut reader).await {
        let name = command.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();
        let reply: &[u8] = match name.as_str() {
            "PING" => b"+PONG\r\n",
            "GET" => b"$-1\r\n",
            "EVALSHA" | "EVAL" => b":0\r\n",
            _ => b"+OK\r\n",
        };
        if write.write_all(reply).await.is_err() {
            return;
        }
        if name == "PING" {
            match behavior {
                Behavior::StallAfterPing => {
                    drain(&mut reader).await;
                    return;
                }
                Behavior::DropFirstAfterPing if first => return,
                _ => {}
            }
        }
    }
}

/// Read and discard until the client hangs up.
async fn drain<R: AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1024];
    while let Ok(n) = reader.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

/// One RESP array of bulk strings, or `None` at end of stream.
async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<String>> {
    let count: usize = read_line(reader).await?.strip_prefix('*')?.parse().ok()?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len: usize = read_line(reader).await?.strip_prefix('$')?.parse().ok()?;
        let mut data = vec![0u8; len + 2];
        reader.read_exact(&mut data).await.ok()?;
        data.truncate(len);
        args.push(String::from_utf8_lossy(&data).into_owned());
    }
    Some(args)
}

async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<String> {
    let mut line = String::new();
    match reader.read_line(&mut line).await {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end().to_string()),
    }
}
