//! State management module.
//!
//! Contains the room registry (shared pad state), the identifiers it hands
//! out, and the background sweeper that evicts idle rooms.

mod app;
mod ids;
mod registry;
mod room;
mod sweeper;

pub use app::AppState;
pub use ids::{ROOM_ID_ALPHABET, ROOM_ID_LEN, RoomId, SessionId, SessionIdGenerator, random_room_id};
pub use registry::RoomRegistry;
pub use room::{PeerTx, Room, RoomSnapshot};
pub use sweeper::{run_sweep, spawn_sweeper};
