//! A single pad and the sessions attached to it.

use crate::cache::Cache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use super::ids::{RoomId, SessionId};

/// Outbound queue of a session's writer task. Frames are pre-encoded JSON.
pub type PeerTx = mpsc::Sender<Arc<str>>;

/// Point-in-time copy of a room's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub text: Arc<str>,
    pub ver: u64,
}

#[derive(Debug)]
struct RoomState {
    text: Arc<str>,
    ver: u64,
    peers: HashMap<SessionId, PeerTx>,
    last_access: Instant,
}

/// Room state shared by every session attached to it.
///
/// Fields sit behind a synchronous lock that is never held across `.await`,
/// so attach/detach can run from `Drop` and from inside registry shard locks.
/// Edits additionally pass through `edit_gate`, which stays held while the
/// new snapshot is written to the cache: cache writes for one room land in
/// version order.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    state: Mutex<RoomState>,
    edit_gate: tokio::sync::Mutex<()>,
}

impl Room {
    pub fn new(id: impl Into<RoomId>, text: impl Into<Arc<str>>, ver: u64) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(RoomState {
                text: text.into(),
                ver,
                peers: HashMap::new(),
                last_access: Instant::now(),
            }),
            edit_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current content without counting as an access.
    pub fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock();
        RoomSnapshot {
            text: Arc::clone(&state.text),
            ver: state.ver,
        }
    }

    /// Current content, marking the room as accessed.
    pub fn read(&self) -> RoomSnapshot {
        let mut state = self.state.lock();
        state.last_access = Instant::now();
        RoomSnapshot {
            text: Arc::clone(&state.text),
            ver: state.ver,
        }
    }

    pub fn touch(&self) {
        self.state.lock().last_access = Instant::now();
    }

    /// Attach a session and return the snapshot it must be initialised with.
    ///
    /// Both happen under one lock, so the session sees every edit made after
    /// its snapshot.
    pub fn attach(&self, session: SessionId, tx: PeerTx) -> RoomSnapshot {
        let mut state = self.state.lock();
        state.peers.insert(session, tx);
        state.last_access = Instant::now();
        RoomSnapshot {
            text: Arc::clone(&state.text),
            ver: state.ver,
        }
    }

    /// Remove a session. Returns `false` if it was already gone.
    pub fn detach(&self, session: SessionId) -> bool {
        self.state.lock().peers.remove(&session).is_some()
    }

    pub fn peer_count(&self) -> usize {
        self.state.lock().peers.len()
    }

    pub fn has_peer(&self, session: SessionId) -> bool {
        self.state.lock().peers.contains_key(&session)
    }

    /// Senders of every attached session except `exclude`.
    pub fn peers_except(&self, exclude: SessionId) -> Vec<(SessionId, PeerTx)> {
        self.state
            .lock()
            .peers
            .iter()
            .filter(|(id, _)| **id != exclude)
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    /// Peer-less and not accessed for longer than `window` as of `now`.
    pub fn is_idle(&self, now: Instant, window: Duration) -> bool {
        let state = self.state.lock();
        state.peers.is_empty() && now.saturating_duration_since(state.last_access) > window
    }

    /// Replace the text wholesale and bump the version by one.
    ///
    /// No merge is attempted: whichever edit takes the gate last wins.
    /// Returns the stored snapshot after it has been mirrored to the cache.
    pub async fn apply_edit(&self, text: String, cache: &Cache) -> RoomSnapshot {
        let _gate = self.edit_gate.lock().await;
        let snapshot = {
            let mut state = self.state.lock();
            state.text = Arc::from(text);
            state.ver += 1;
            state.last_access = Instant::now();
            RoomSnapshot {
                text: Arc::clone(&state.text),
                ver: state.ver,
            }
        };
        cache.write(&self.id, &snapshot.text, snapshot.ver).await;
        snapshot
    }

    /// Shift the last-access time into the past.
    #[cfg(test)]
    pub(crate) fn backdate(&self, by: Duration) {
        let mut state = self.state.lock();
        if let Some(earlier) = state.last_access.checked_sub(by) {
            state.last_access = earlier;
        }
    }
}
