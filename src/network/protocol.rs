//! JSON frames exchanged over a pad WebSocket.
//!
//! Server frames are tagged by `type` (`init`, `update`, `error`). Client
//! frames are read leniently: only `type: "edit"` has meaning, anything else
//! is ignored. `clientId` is opaque and echoed back exactly as received.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A frame sent from the server to a session.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage<'a> {
    /// Current room state, sent once right after attach.
    Init { text: &'a str, ver: u64 },
    /// An accepted edit from another session.
    Update {
        text: &'a str,
        ver: u64,
        #[serde(rename = "clientId")]
        client_id: Option<&'a Value>,
    },
    /// A rejected edit. Sent only to the session that submitted it.
    Error { message: &'a str },
}

impl ServerMessage<'_> {
    /// Encode once so the same frame can be shared by every recipient.
    pub fn to_frame(&self) -> Result<Arc<str>, serde_json::Error> {
        serde_json::to_string(self).map(Arc::from)
    }
}

/// Raw shape of a frame sent by a client.
#[derive(Debug, Default, Deserialize)]
struct ClientFrame {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    text: Option<Value>,
    #[serde(rename = "clientId", default)]
    client_id: Option<Value>,
}

/// A decoded client frame.
///
/// The client's `ver` is informational and never read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Edit {
        text: String,
        client_id: Option<Value>,
    },
    Ignored,
}

impl ClientMessage {
    /// Decode a text frame. Malformed JSON is an error; unknown types are not.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let frame: ClientFrame = serde_json::from_str(raw)?;
        Ok(match frame.kind.as_deref() {
            Some("edit") => Self::Edit {
                text: text_of(frame.text),
                client_id: frame.client_id,
            },
            _ => Self::Ignored,
        })
    }
}

/// Strings pass through; other scalars and structures become their JSON text.
fn text_of(value: Option<Value>) -> String {
    match value {
        Some(Value::String(text)) => text,
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}
