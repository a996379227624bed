//! WebSocket session loop.
//!
//! ```text
//! socket ──split──► stream ──► read loop ──► Room::apply_edit ──► fanout
//!              └──► sink ◄── writer task ◄── outbound queue ◄──────┘
//! ```
//!
//! The init frame goes straight to the sink before the writer starts, so an
//! update queued during attach can never overtake it.

use crate::error::{PadError, SessionError};
use crate::network::fanout;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::security::ConnectionPermit;
use crate::state::{AppState, Room, SessionId};
use crate::telemetry::spans;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info};

/// Capacity of each session's outbound queue.
pub const OUTBOUND_QUEUE: usize = 64;

/// How long a closing session waits for queued frames to flush.
const WRITER_DRAIN: Duration = Duration::from_secs(5);

/// Membership of one session in one room. Dropping it detaches the session.
struct Attachment {
    room: Arc<Room>,
    session: SessionId,
}

impl Attachment {
    fn new(room: Arc<Room>, session: SessionId) -> Self {
        crate::metrics::session_opened();
        Self { room, session }
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        self.room.detach(self.session);
        crate::metrics::session_closed();
    }
}

/// Which half of the session stopped first.
enum Ended {
    Reader(Result<(), SessionError>),
    Writer(Result<(), SessionError>),
}

/// Run an admitted session until the peer leaves or misbehaves.
///
/// `permit` is held for the whole session and released on every exit path.
pub async fn run(
    socket: WebSocket,
    state: AppState,
    room_id: String,
    ip: IpAddr,
    permit: ConnectionPermit,
) {
    let session = state.session_ids.next();
    let span = spans::session(&room_id, ip, &session.to_string());

    async move {
        let _permit = permit;
        debug!("Session admitted");
        match drive(socket, &state, &room_id, session).await {
            Ok(()) => debug!("Session closed"),
            Err(e) => info!(error = %e, code = e.error_code(), "Session ended"),
        }
    }
    .instrument(span)
    .await;
}

async fn drive(
    socket: WebSocket,
    state: &AppState,
    room_id: &str,
    session: SessionId,
) -> Result<(), SessionError> {
    let (mut sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
    let own_queue = tx.downgrade();

    let (room, snapshot) = state.registry.attach(room_id, session, tx).await;
    let attachment = Attachment::new(Arc::clone(&room), session);

    let init = ServerMessage::Init {
        text: &snapshot.text,
        ver: snapshot.ver,
    }
    .to_frame()?;
    sink.send(Message::Text(init.to_string())).await?;
    debug!(ver = snapshot.ver, "Sent init");

    let mut writer = tokio::spawn(write_frames(sink, rx));

    let ended = tokio::select! {
        result = read_frames(&mut stream, state, &room, session, &own_queue) => Ended::Reader(result),
        joined = &mut writer => Ended::Writer(match joined {
            Ok(Ok(())) => Err(SessionError::QueueClosed),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SessionError::QueueClosed),
        }),
    };

    match ended {
        Ended::Reader(result) => {
            drop(attachment);
            finish_writer(writer).await;
            result
        }
        Ended::Writer(result) => result,
    }
}

/// Handle inbound frames until close, transport error, or protocol violation.
async fn read_frames(
    stream: &mut SplitStream<WebSocket>,
    state: &AppState,
    room: &Room,
    session: SessionId,
    own_queue: &mpsc::WeakSender<Arc<str>>,
) -> Result<(), SessionError> {
    while let Some(inbound) = stream.next().await {
        match inbound? {
            Message::Text(raw) => match ClientMessage::parse(&raw) {
                Ok(ClientMessage::Edit { text, client_id }) => {
                    handle_edit(state, room, session, own_queue, text, client_id).await?;
                }
                Ok(ClientMessage::Ignored) => {}
                Err(e) => return Err(SessionError::Protocol(format!("invalid JSON: {e}"))),
            },
            Message::Binary(_) => {
                return Err(SessionError::Protocol("binary frame".to_string()));
            }
            Message::Close(_) => return Ok(()),
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }
    Ok(())
}

async fn handle_edit(
    state: &AppState,
    room: &Room,
    session: SessionId,
    own_queue: &mpsc::WeakSender<Arc<str>>,
    text: String,
    client_id: Option<serde_json::Value>,
) -> Result<(), SessionError> {
    let max = state.config.limits.max_text_bytes;
    if text.len() > max {
        let err = PadError::TooLarge { max };
        crate::metrics::record_rejected(err.error_code());
        debug!(size = text.len(), max, "Edit rejected");
        let message = err.edit_message();
        let frame = ServerMessage::Error { message: &message }.to_frame()?;
        let queue = own_queue.upgrade().ok_or(SessionError::QueueClosed)?;
        return queue.send(frame).await.map_err(|_| SessionError::QueueClosed);
    }

    let snapshot = room.apply_edit(text, state.registry.cache()).await;
    crate::metrics::record_edit();

    let frame = ServerMessage::Update {
        text: &snapshot.text,
        ver: snapshot.ver,
        client_id: client_id.as_ref(),
    }
    .to_frame()?;
    let recipients = fanout::broadcast(room, &frame, session);
    debug!(ver = snapshot.ver, recipients, "Edit applied");
    Ok(())
}

/// Drain the outbound queue into the socket. Returns once the queue closes.
async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Arc<str>>,
) -> Result<(), SessionError> {
    while let Some(frame) = rx.recv().await {
        sink.send(Message::Text(frame.to_string())).await?;
    }
    // Peer may already be gone.
    let _ = sink.close().await;
    Ok(())
}

async fn finish_writer(mut writer: JoinHandle<Result<(), SessionError>>) {
    if tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }
}
