use crate::error::RegistryError;
use crate::room::{Member, Room};
use ferry_core::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// What happened to a room after a member left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The room became empty and was dropped from the registry.
    Removed,
    /// The room lives on with this many members.
    Remaining(usize),
}

/// All currently existing rooms, keyed by their caller-chosen id.
///
/// A single reader/writer lock guards the map. Lookups share it; creating,
/// removing and changing a room's membership take it exclusively so that a
/// room is never observed empty-but-registered by a concurrent join.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<String, Arc<Room>>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new, empty room.
    pub async fn create_room(&self, room_id: &str) -> Result<Arc<Room>, RegistryError> {
        let mut rooms = self.rooms.write().await;
        Self::insert_room(&mut rooms, room_id)
    }

    pub async fn get_room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn remove_room(&self, room_id: &str) -> Option<Arc<Room>> {
        let removed = self.rooms.write().await.remove(room_id);
        if removed.is_some() {
            info!("Room {} removed", room_id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    pub async fn room_ids(&self) -> Vec<String> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Creates `room_id` with `member` as its first occupant in one step.
    pub async fn create_with_member(
        &self,
        room_id: &str,
        id: ConnectionId,
        member: Member,
    ) -> Result<Arc<Room>, RegistryError> {
        let mut rooms = self.rooms.write().await;
        let room = Self::insert_room(&mut rooms, room_id)?;
        room.add_member(id, member).await;
        Ok(room)
    }

    /// Adds `member` to an existing room. Never creates one.
    pub async fn join(&self, room_id: &str, id: ConnectionId, member: Member) -> Option<Arc<Room>> {
        let rooms = self.rooms.write().await;
        let room = rooms.get(room_id)?.clone();
        room.add_member(id, member).await;
        Some(room)
    }

    /// Takes `id` out of `room`, dropping the room once it is empty.
    pub async fn leave(&self, room: &Arc<Room>, id: &ConnectionId) -> LeaveOutcome {
        let mut rooms = self.rooms.write().await;
        let remaining = room.remove_member(id).await;
        if remaining > 0 {
            return LeaveOutcome::Remaining(remaining);
        }

        let registered = rooms
            .get(room.id())
            .is_some_and(|current| Arc::ptr_eq(current, room));
        if registered {
            rooms.remove(room.id());
            info!("Room {} removed (no members left)", room.id());
        }
        LeaveOutcome::Removed
    }

    fn insert_room(
        rooms: &mut HashMap<String, Arc<Room>>,
        room_id: &str,
    ) -> Result<Arc<Room>, RegistryError> {
        if rooms.contains_key(room_id) {
            return Err(RegistryError::DuplicateRoom(room_id.to_owned()));
        }
        let room = Arc::new(Room::new(room_id));
        rooms.insert(room_id.to_owned(), room.clone());
        info!("Room {} created", room_id);
        Ok(room)
    }
}
