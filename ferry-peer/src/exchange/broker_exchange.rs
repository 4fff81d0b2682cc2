use crate::error::ExchangeError;
use crate::exchange::{DescriptionExchange, RemoteDescription, SignalingClient};
use async_trait::async_trait;
use ferry_core::{ClientRole, MessageType, SignalMessage};
use tracing::{debug, info};

/// Moves descriptions through a room on the signaling broker.
///
/// The sender creates the room, waits for `peer_joined`, sends its `offer`
/// and waits for the `answer`. The receiver joins, waits for the `offer`
/// (adopting its file id) and replies with an `answer`. An `error` from the
/// broker, or `peer_left` while waiting, ends the exchange.
pub struct BrokerExchange {
    client: SignalingClient,
    room_id: String,
    file_id: String,
    role: Option<ClientRole>,
}

impl BrokerExchange {
    pub fn new(client: SignalingClient, room_id: impl Into<String>) -> Self {
        Self {
            client,
            room_id: room_id.into(),
            file_id: String::new(),
            role: None,
        }
    }

    /// File id announced with the offer.
    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = file_id.into();
        self
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    async fn expect(&mut self, wanted: MessageType) -> Result<SignalMessage, ExchangeError> {
        loop {
            let msg = self.client.recv().await?;
            match msg.kind {
                kind if kind == wanted => return Ok(msg),
                MessageType::Error => return Err(ExchangeError::Server(msg.error)),
                MessageType::PeerLeft => return Err(ExchangeError::PeerLeft),
                other => debug!("Ignoring {} while waiting for {}", other, wanted),
            }
        }
    }

    fn role(&self) -> Result<ClientRole, ExchangeError> {
        self.role.ok_or(ExchangeError::NotOpened)
    }
}

#[async_trait]
impl DescriptionExchange for BrokerExchange {
    async fn open(&mut self, role: ClientRole) -> Result<(), ExchangeError> {
        let (request, confirmation) = match role {
            ClientRole::Sender => (
                SignalMessage::create_room(self.room_id.as_str()),
                MessageType::RoomCreated,
            ),
            ClientRole::Receiver => (
                SignalMessage::join_room(self.room_id.as_str()),
                MessageType::RoomJoined,
            ),
        };
        self.client.send(request)?;
        self.expect(confirmation).await?;
        self.role = Some(role);
        info!("Entered room {} as {}", self.room_id, role);
        Ok(())
    }

    async fn wait_for_peer(&mut self) -> Result<(), ExchangeError> {
        self.expect(MessageType::PeerJoined).await?;
        info!("Receiver joined room {}", self.room_id);
        Ok(())
    }

    async fn send_description(&mut self, blob: &str) -> Result<(), ExchangeError> {
        let msg = match self.role()? {
            ClientRole::Sender => {
                SignalMessage::offer(self.room_id.as_str(), self.file_id.as_str(), blob)
            }
            ClientRole::Receiver => SignalMessage::answer(self.room_id.as_str(), blob),
        };
        self.client.send(msg)
    }

    async fn receive_description(&mut self) -> Result<RemoteDescription, ExchangeError> {
        let wanted = match self.role()? {
            ClientRole::Sender => MessageType::Answer,
            ClientRole::Receiver => MessageType::Offer,
        };
        let msg = self.expect(wanted).await?;
        if !msg.file_id.is_empty() {
            self.file_id = msg.file_id.clone();
        }
        Ok(RemoteDescription {
            blob: msg.sdp,
            file_id: (!msg.file_id.is_empty()).then_some(msg.file_id),
        })
    }

    async fn close(&mut self) {
        self.client.close().await;
    }
}
