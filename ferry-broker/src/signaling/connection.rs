use crate::error::ProtocolError;
use crate::room::Room;
use ferry_core::{ClientRole, ConnectionId, SignalMessage};
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, error, warn};

/// Cloneable sending side of one signaling connection.
///
/// Rooms hold these to broadcast. Enqueueing never blocks: a full queue
/// means the peer is not draining its socket, so the connection is shut
/// down instead of stalling the broadcaster.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<String>,
    shutdown: Arc<Notify>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (outbound, rx) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id,
            outbound,
            shutdown: Arc::new(Notify::new()),
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Serialises and queues `msg`. Returns whether it was queued.
    pub fn enqueue(&self, msg: &SignalMessage) -> bool {
        match msg.to_json() {
            Ok(json) => self.enqueue_text(json),
            Err(e) => {
                error!("Failed to serialize signal message: {}", e);
                false
            }
        }
    }

    pub fn enqueue_text(&self, text: String) -> bool {
        match self.outbound.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Outbound queue full for {}, closing connection", self.id);
                self.close();
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Dropping message for closed connection {}", self.id);
                false
            }
        }
    }

    /// Asks the connection's read loop to stop.
    pub fn close(&self) {
        self.shutdown.notify_one();
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        self.shutdown.notified().await;
    }
}

/// Per-connection state, owned by that connection's read loop.
pub struct Connection {
    handle: ConnectionHandle,
    pub(crate) room: Option<Arc<Room>>,
    pub(crate) role: Option<ClientRole>,
}

impl Connection {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            room: None,
            role: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn room(&self) -> Option<&Arc<Room>> {
        self.room.as_ref()
    }

    pub fn role(&self) -> Option<ClientRole> {
        self.role
    }

    pub fn reply(&self, msg: &SignalMessage) {
        self.handle.enqueue(msg);
    }

    pub fn reply_error(&self, err: &ProtocolError) {
        debug!("Protocol error on {}: {}", self.id(), err);
        self.reply(&SignalMessage::error(err.to_string()));
    }
}
