//! Delivery of accepted edits to the other sessions in a room.

use crate::state::{Room, SessionId};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Queue `frame` for every session attached to `room` except `exclude`.
///
/// Delivery never waits on a slow peer. A peer whose queue is closed or full
/// is detached; the rest still receive the frame. Returns the number of
/// sessions the frame was queued for.
pub fn broadcast(room: &Room, frame: &Arc<str>, exclude: SessionId) -> usize {
    let mut delivered = 0;
    for (session, sender) in room.peers_except(exclude) {
        match sender.try_send(Arc::clone(frame)) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(room = %room.id(), session = %session, "Outbound queue full, detaching peer");
                room.detach(session);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(room = %room.id(), session = %session, "Peer gone, detaching");
                room.detach(session);
            }
        }
    }
    crate::metrics::record_fanout(delivered);
    delivered
}
