use crate::config::BrokerConfig;
use crate::error::{ProtocolError, RegistryError};
use crate::room::{LeaveOutcome, Member, RoomRegistry};
use crate::signaling::{Connection, ConnectionHandle};
use ferry_core::{ClientRole, ConnectionId, MessageType, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Room-based relay for session descriptions.
///
/// The broker never looks inside the `sdp` it forwards. Cloning is cheap;
/// every clone shares the same registry.
#[derive(Clone)]
pub struct Broker {
    registry: RoomRegistry,
    config: Arc<BrokerConfig>,
}

impl Broker {
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            registry: RoomRegistry::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub async fn room_count(&self) -> usize {
        self.registry.len().await
    }

    /// Registers a fresh connection and hands back the receiving end of its
    /// outbound queue for the write loop to drain.
    pub fn connect(&self) -> (Connection, mpsc::Receiver<String>) {
        let (handle, rx) = ConnectionHandle::new(ConnectionId::new(), self.config.outbound_capacity);
        (Connection::new(handle), rx)
    }

    /// Decodes one text frame and dispatches it; protocol errors are
    /// reported back to `conn`.
    pub async fn dispatch_frame(&self, conn: &mut Connection, text: &str) {
        let result = match SignalMessage::parse(text) {
            Ok(msg) => self.dispatch(conn, msg).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            conn.reply_error(&e);
        }
    }

    pub async fn dispatch(
        &self,
        conn: &mut Connection,
        msg: SignalMessage,
    ) -> Result<(), ProtocolError> {
        match msg.kind {
            MessageType::CreateRoom => self.create_room(conn, msg).await,
            MessageType::JoinRoom => self.join_room(conn, msg).await,
            MessageType::Offer => self.relay(conn, msg, ClientRole::Sender).await,
            MessageType::Answer => self.relay(conn, msg, ClientRole::Receiver).await,
            other => Err(ProtocolError::ServerOnly(other)),
        }
    }

    async fn create_room(
        &self,
        conn: &mut Connection,
        msg: SignalMessage,
    ) -> Result<(), ProtocolError> {
        if msg.room_id.is_empty() {
            return Err(ProtocolError::InvalidRoomId);
        }
        if let Some(room) = conn.room() {
            return Err(ProtocolError::AlreadyInRoom(room.id().to_owned()));
        }

        let member = Member {
            role: ClientRole::Sender,
            handle: conn.handle().clone(),
        };
        let room = self
            .registry
            .create_with_member(&msg.room_id, conn.id(), member)
            .await
            .map_err(|RegistryError::DuplicateRoom(id)| ProtocolError::RoomExists(id))?;

        conn.room = Some(room);
        conn.role = Some(ClientRole::Sender);
        info!("Room {} created by {} (sender)", msg.room_id, conn.id());

        conn.reply(&SignalMessage::room_created(&msg.room_id));
        Ok(())
    }

    async fn join_room(
        &self,
        conn: &mut Connection,
        msg: SignalMessage,
    ) -> Result<(), ProtocolError> {
        if msg.room_id.is_empty() {
            return Err(ProtocolError::InvalidRoomId);
        }
        if let Some(room) = conn.room() {
            return Err(ProtocolError::AlreadyInRoom(room.id().to_owned()));
        }

        let member = Member {
            role: ClientRole::Receiver,
            handle: conn.handle().clone(),
        };
        let room = self
            .registry
            .join(&msg.room_id, conn.id(), member)
            .await
            .ok_or_else(|| ProtocolError::RoomNotFound(msg.room_id.clone()))?;

        conn.room = Some(room.clone());
        conn.role = Some(ClientRole::Receiver);
        info!("{} joined room {} (receiver)", conn.id(), msg.room_id);

        conn.reply(&SignalMessage::room_joined(&msg.room_id));
        room.broadcast(&SignalMessage::peer_joined(&msg.room_id), conn.id())
            .await;
        Ok(())
    }

    /// Forwards an `offer` or `answer` to the other members of the room.
    async fn relay(
        &self,
        conn: &mut Connection,
        msg: SignalMessage,
        required: ClientRole,
    ) -> Result<(), ProtocolError> {
        let room = conn.room().cloned().ok_or(ProtocolError::NotInRoom)?;
        if conn.role() != Some(required) {
            return Err(ProtocolError::WrongRole {
                action: msg.kind,
                required,
            });
        }

        let forwarded = match msg.kind {
            MessageType::Offer => SignalMessage::offer(room.id(), msg.file_id, msg.sdp),
            _ => SignalMessage::answer(room.id(), msg.sdp),
        };
        let delivered = room.broadcast(&forwarded, conn.id()).await;
        if delivered == 0 {
            warn!(
                "{} from {} in room {} reached nobody",
                forwarded.kind,
                conn.id(),
                room.id()
            );
        }
        Ok(())
    }

    /// Takes `conn` out of its room, dropping the room if it is now empty
    /// and telling the remaining members otherwise.
    pub async fn leave(&self, conn: &mut Connection) {
        let Some(room) = conn.room.take() else {
            return;
        };

        match self.registry.leave(&room, &conn.id()).await {
            LeaveOutcome::Removed => {
                info!("{} left room {}, room removed", conn.id(), room.id());
            }
            LeaveOutcome::Remaining(count) => {
                info!(
                    "{} left room {}, {} member(s) remain",
                    conn.id(),
                    room.id(),
                    count
                );
                room.broadcast(&SignalMessage::peer_left(room.id()), conn.id())
                    .await;
            }
        }
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}
