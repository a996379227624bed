//! Room and session identifiers.

use rand::Rng;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a pad, as it appears in URLs.
pub type RoomId = String;

/// Characters a generated room identifier is drawn from.
pub const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated room identifier.
pub const ROOM_ID_LEN: usize = 4;

/// Generate a fresh random room identifier.
pub fn random_room_id() -> RoomId {
    let mut rng = rand::thread_rng();
    (0..ROOM_ID_LEN)
        .map(|_| ROOM_ID_ALPHABET[rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
        .collect()
}

/// Process-unique identity of one WebSocket session.
///
/// Distinct from the client-supplied `clientId`, which is opaque and may be
/// shared or forged; fan-out exclusion always uses this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Hands out monotonically increasing session ids.
#[derive(Debug, Default)]
pub struct SessionIdGenerator {
    counter: AtomicU64,
}

impl SessionIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next unique session id.
    pub fn next(&self) -> SessionId {
        SessionId(self.counter.fetch_add(1, Ordering::Relaxed))
    }
}
