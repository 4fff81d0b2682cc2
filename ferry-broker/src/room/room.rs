use crate::signaling::ConnectionHandle;
use ferry_core::{ClientRole, ConnectionId, SignalMessage};
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// A connection's seat in a room.
#[derive(Clone, Debug)]
pub struct Member {
    pub role: ClientRole,
    pub handle: ConnectionHandle,
}

/// An ephemeral group of the connections negotiating one transfer.
///
/// Membership lives behind its own reader/writer lock: broadcasts share it,
/// joins and leaves (driven by [`crate::RoomRegistry`]) take it exclusively.
#[derive(Debug)]
pub struct Room {
    id: String,
    members: RwLock<HashMap<ConnectionId, Member>>,
    created_at: SystemTime,
}

impl Room {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: RwLock::new(HashMap::new()),
            created_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub(crate) async fn add_member(&self, id: ConnectionId, member: Member) {
        self.members.write().await.insert(id, member);
    }

    /// Removes `id` and returns how many members remain.
    pub(crate) async fn remove_member(&self, id: &ConnectionId) -> usize {
        let mut members = self.members.write().await;
        members.remove(id);
        members.len()
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    /// Queues `msg` for every member except `exclude`.
    ///
    /// Returns the number of members the message was queued for.
    pub async fn broadcast(&self, msg: &SignalMessage, exclude: ConnectionId) -> usize {
        let json = match msg.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize broadcast for room {}: {}", self.id, e);
                return 0;
            }
        };

        let members = self.members.read().await;
        let mut delivered = 0;
        for (id, member) in members.iter() {
            if *id == exclude {
                continue;
            }
            if member.handle.enqueue_text(json.clone()) {
                delivered += 1;
            }
        }
        debug!(
            "Broadcast {} in room {} to {} member(s)",
            msg.kind, self.id, delivered
        );
        delivered
    }
}
