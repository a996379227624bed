//! HTTP surface: pad creation, the browser client, raw text and the
//! WebSocket upgrade.

use crate::config::Config;
use crate::error::{PadError, validate_body};
use crate::network::session;
use crate::state::{AppState, random_room_id};
use crate::telemetry::spans;
use axum::body::Body;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{ConnectInfo, Path, State};
use axum::http::HeaderMap;
use axum::http::header::HOST;
use axum::response::{Html, IntoResponse, Redirect, Response};
use futures_util::StreamExt;
use std::borrow::Cow;
use std::net::{IpAddr, SocketAddr};
use tracing::{Instrument, debug, warn};

/// Close reason sent when an address is over its connection limit.
pub const POLICY_CLOSE_REASON: &str = "Too many connections from this IP";

/// Browser client served at `/{id}/`.
const PAD_HTML: &str = include_str!("../../assets/pad.html");

/// `GET /` - send the browser to a fresh random pad.
pub async fn new_pad() -> Redirect {
    Redirect::temporary(&format!("/{}/", random_room_id()))
}

/// `POST /` - create a pad from the raw request body and return its URL.
pub async fn create_pad(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Body,
) -> Result<String, PadError> {
    create(&state, addr.ip(), &headers, body)
        .instrument(spans::request("create", None))
        .await
}

async fn create(
    state: &AppState,
    ip: IpAddr,
    headers: &HeaderMap,
    body: Body,
) -> Result<String, PadError> {
    if !state.rate_limiter.check(ip) {
        let err = PadError::RateLimited {
            limit: state.rate_limiter.limit(),
        };
        crate::metrics::record_rejected(err.error_code());
        warn!(%ip, "Create rate limit exceeded");
        return Err(err);
    }

    let max = state.config.limits.max_text_bytes;
    let text = read_capped(body, max)
        .await
        .and_then(|bytes| validate_body(&bytes, max))
        .inspect_err(|e| crate::metrics::record_rejected(e.error_code()))?;

    let id = state.registry.create(text).await;
    debug!(%ip, room = %id, "Pad created from upload");
    Ok(format!("{}/{}/\n", base_url(&state.config, headers), id))
}

/// Buffer a request body, giving up as soon as it passes `max` bytes.
async fn read_capped(body: Body, max: usize) -> Result<Vec<u8>, PadError> {
    let mut chunks = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| {
            debug!(error = %e, "Request body read failed");
            PadError::BodyRead
        })?;
        if buf.len() + chunk.len() > max {
            return Err(PadError::TooLarge { max });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// `GET /{id}/` - serve the browser client and mark the pad as accessed.
pub async fn pad_page(State(state): State<AppState>, Path(room): Path<String>) -> Html<&'static str> {
    state.registry.touch(&room).await;
    Html(PAD_HTML)
}

/// `GET /{id}/raw` - current text, or empty if the pad exists nowhere.
pub async fn raw_text(State(state): State<AppState>, Path(room): Path<String>) -> String {
    let span = spans::request("raw", Some(&room));
    state
        .registry
        .read_text(&room)
        .instrument(span)
        .await
        .to_string()
}

/// `GET /ws/{id}` - admit a WebSocket session, or close it with a policy code.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Path(room): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    let ip = addr.ip();
    match state.connections.try_acquire(ip) {
        Some(permit) => ws
            .on_upgrade(move |socket| session::run(socket, state, room, ip, permit))
            .into_response(),
        None => {
            crate::metrics::record_connection_refused();
            warn!(%ip, room = %room, limit = state.connections.max_per_ip(), "Connection limit reached");
            ws.on_upgrade(refuse).into_response()
        }
    }
}

async fn refuse(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: Cow::Borrowed(POLICY_CLOSE_REASON),
    };
    // Nothing to clean up if the peer is already gone.
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Base URL for links handed back to uploaders.
fn base_url(config: &Config, headers: &HeaderMap) -> String {
    if let Some(url) = &config.server.public_url {
        return url.trim_end_matches('/').to_string();
    }
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| config.server.listen.to_string());
    let scheme = match headers.get("x-forwarded-proto").and_then(|h| h.to_str().ok()) {
        Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    format!("{scheme}://{host}")
}
