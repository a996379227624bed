//! Room registry: the in-process map of room id to shared room state.
//!
//! Local misses fall through to the cache, so a room written by another
//! instance (or before a restart) is hydrated transparently.

use crate::cache::Cache;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::ids::{RoomId, SessionId, random_room_id};
use super::room::{PeerTx, Room, RoomSnapshot};

/// Version a room created through `POST /` starts at.
pub const CREATED_ROOM_VERSION: u64 = 1;

#[derive(Debug)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Arc<Room>>,
    cache: Cache,
}

impl RoomRegistry {
    pub fn new(cache: Cache) -> Self {
        Self {
            rooms: DashMap::new(),
            cache,
        }
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Local lookup only; never consults the cache.
    pub fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Local lookup, then cache hydration. `None` if the room exists nowhere.
    pub async fn lookup(&self, id: &str) -> Option<Arc<Room>> {
        if let Some(room) = self.get(id) {
            return Some(room);
        }
        let cached = self.cache.read(id).await?;
        debug!(room = %id, ver = cached.ver, "Hydrating room from cache");
        Some(self.insert_if_absent(id, || Room::new(id, cached.text, cached.ver)))
    }

    /// Lookup, hydrating from the cache or creating an empty room at version 0.
    pub async fn get_or_create(&self, id: &str) -> Arc<Room> {
        if let Some(room) = self.lookup(id).await {
            return room;
        }
        self.insert_if_absent(id, || Room::new(id, "", 0))
    }

    fn insert_if_absent(&self, id: &str, make: impl FnOnce() -> Room) -> Arc<Room> {
        let room = Arc::clone(
            self.rooms
                .entry(id.to_string())
                .or_insert_with(|| Arc::new(make()))
                .value(),
        );
        crate::metrics::set_active_rooms(self.rooms.len());
        room
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Room>> {
        let removed = self.rooms.remove(id).map(|(_, room)| room);
        crate::metrics::set_active_rooms(self.rooms.len());
        removed
    }

    /// Attach a session to a room, creating or hydrating it as needed.
    ///
    /// The attach happens while the map entry is held, so the sweeper cannot
    /// evict the room between lookup and attach.
    pub async fn attach(&self, id: &str, session: SessionId, tx: PeerTx) -> (Arc<Room>, RoomSnapshot) {
        let attached = loop {
            self.get_or_create(id).await;
            if let Some(entry) = self.rooms.get(id) {
                let snapshot = entry.attach(session, tx.clone());
                break (Arc::clone(entry.value()), snapshot);
            }
        };
        self.cache.touch(id).await;
        attached
    }

    /// Mark a room as accessed, locally and in the cache.
    pub async fn touch(&self, id: &str) {
        if let Some(room) = self.get(id) {
            room.touch();
        }
        self.cache.touch(id).await;
    }

    /// Current text of a room, or empty text if it exists nowhere.
    pub async fn read_text(&self, id: &str) -> Arc<str> {
        match self.lookup(id).await {
            Some(room) => {
                let snapshot = room.read();
                self.cache.touch(id).await;
                snapshot.text
            }
            None => Arc::from(""),
        }
    }

    /// Create a room with initial content under a fresh random id.
    pub async fn create(&self, text: String) -> RoomId {
        let text: Arc<str> = Arc::from(text);
        let id = loop {
            let candidate = random_room_id();
            if self.cache.read(&candidate).await.is_some() {
                continue;
            }
            if let Entry::Vacant(slot) = self.rooms.entry(candidate.clone()) {
                slot.insert(Arc::new(Room::new(
                    candidate.clone(),
                    Arc::clone(&text),
                    CREATED_ROOM_VERSION,
                )));
                break candidate;
            }
        };
        crate::metrics::set_active_rooms(self.rooms.len());
        self.cache.write(&id, &text, CREATED_ROOM_VERSION).await;
        info!(room = %id, bytes = text.len(), "Room created");
        id
    }

    /// Evict every room that has no sessions and has been idle longer than
    /// `window` as of `now`. The cache is left to expire on its own.
    pub fn sweep(&self, now: Instant, window: Duration) -> Vec<RoomId> {
        let candidates: Vec<RoomId> = self.rooms.iter().map(|e| e.key().clone()).collect();
        let removed: Vec<RoomId> = candidates
            .into_iter()
            .filter(|id| {
                self.rooms
                    .remove_if(id, |_, room| room.is_idle(now, window))
                    .is_some()
            })
            .collect();
        crate::metrics::set_active_rooms(self.rooms.len());
        removed
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
