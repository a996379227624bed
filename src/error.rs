//! Unified error handling for aukpad.
//!
//! Request and message level failures live in [`PadError`]; cache failures
//! live in [`crate::cache::CacheError`] and never reach a requester.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ============================================================================
// Pad Errors (admission and validation)
// ============================================================================

/// Errors surfaced to a client for a single request or edit message.
///
/// None of these mutate room state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PadError {
    #[error("Empty content not allowed")]
    EmptyBody,

    #[error("Content must be valid UTF-8")]
    InvalidUtf8,

    #[error("Null bytes not allowed")]
    NullByte,

    #[error("Failed to read request body")]
    BodyRead,

    #[error("Content too large. Max size: {max} bytes")]
    TooLarge { max: usize },

    #[error("Rate limit exceeded. Max {limit} requests per hour.")]
    RateLimited { limit: usize },
}

impl PadError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBody => "empty_body",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::NullByte => "null_byte",
            Self::BodyRead => "body_read",
            Self::TooLarge { .. } => "too_large",
            Self::RateLimited { .. } => "rate_limited",
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::EmptyBody | Self::InvalidUtf8 | Self::NullByte | Self::BodyRead => {
                StatusCode::BAD_REQUEST
            }
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Message sent in a WebSocket `error` frame for an oversize edit.
    pub fn edit_message(&self) -> String {
        match self {
            Self::TooLarge { max } => format!("Text too large. Max size: {max} bytes"),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PadError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

// ============================================================================
// Session Errors (WebSocket lifecycle)
// ============================================================================

/// Reasons a WebSocket session ends abnormally.
///
/// All of them close the session; none are reported back to the peer.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(#[from] axum::Error),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("outbound queue closed")]
    QueueClosed,
}

impl SessionError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Protocol(_) => "protocol",
            Self::Encode(_) => "encode",
            Self::QueueClosed => "queue_closed",
        }
    }
}

/// Validate a raw `POST /` body and decode it.
pub fn validate_body(body: &[u8], max_bytes: usize) -> Result<String, PadError> {
    if body.is_empty() {
        return Err(PadError::EmptyBody);
    }
    let text = std::str::from_utf8(body).map_err(|_| PadError::InvalidUtf8)?;
    if text.contains('\0') {
        return Err(PadError::NullByte);
    }
    if body.len() > max_bytes {
        return Err(PadError::TooLarge { max: max_bytes });
    }
    Ok(text.to_owned())
}
