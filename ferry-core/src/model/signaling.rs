use crate::error::MessageError;
use crate::model::role::ClientRole;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every `type` the signaling protocol knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    CreateRoom,
    JoinRoom,
    Offer,
    Answer,
    PeerJoined,
    PeerLeft,
    RoomCreated,
    RoomJoined,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::CreateRoom => "create_room",
            MessageType::JoinRoom => "join_room",
            MessageType::Offer => "offer",
            MessageType::Answer => "answer",
            MessageType::PeerJoined => "peer_joined",
            MessageType::PeerLeft => "peer_left",
            MessageType::RoomCreated => "room_created",
            MessageType::RoomJoined => "room_joined",
            MessageType::Error => "error",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single signaling frame, shared by the broker and the peers.
///
/// All fields except `type` are omitted from the wire when empty. The `sdp`
/// field is an opaque base64 blob; nothing on the signaling path decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalMessage {
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub room_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sdp: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub client_type: String,
}

/// Just enough of a frame to tell an unknown `type` apart from garbage.
#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
}

impl SignalMessage {
    pub fn new(kind: MessageType) -> Self {
        Self {
            kind,
            room_id: String::new(),
            file_id: String::new(),
            sdp: String::new(),
            error: String::new(),
            client_type: String::new(),
        }
    }

    pub fn create_room(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::CreateRoom).with_room(room_id)
    }

    pub fn join_room(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::JoinRoom).with_room(room_id)
    }

    pub fn offer(
        room_id: impl Into<String>,
        file_id: impl Into<String>,
        sdp: impl Into<String>,
    ) -> Self {
        let mut msg = Self::new(MessageType::Offer).with_room(room_id);
        msg.file_id = file_id.into();
        msg.sdp = sdp.into();
        msg
    }

    pub fn answer(room_id: impl Into<String>, sdp: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageType::Answer).with_room(room_id);
        msg.sdp = sdp.into();
        msg
    }

    pub fn room_created(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::RoomCreated)
            .with_room(room_id)
            .with_role(ClientRole::Sender)
    }

    pub fn room_joined(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::RoomJoined)
            .with_room(room_id)
            .with_role(ClientRole::Receiver)
    }

    pub fn peer_joined(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::PeerJoined).with_room(room_id)
    }

    pub fn peer_left(room_id: impl Into<String>) -> Self {
        Self::new(MessageType::PeerLeft).with_room(room_id)
    }

    pub fn error(text: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageType::Error);
        msg.error = text.into();
        msg
    }

    pub fn with_room(mut self, room_id: impl Into<String>) -> Self {
        self.room_id = room_id.into();
        self
    }

    pub fn with_role(mut self, role: ClientRole) -> Self {
        self.client_type = role.as_str().to_owned();
        self
    }

    /// Decodes one text frame.
    ///
    /// A well-formed frame whose `type` is not part of the protocol yields
    /// [`MessageError::UnknownType`] so the caller can report it by name.
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        match serde_json::from_str::<SignalMessage>(text) {
            Ok(msg) => Ok(msg),
            Err(err) => match serde_json::from_str::<Envelope>(text) {
                Ok(envelope)
                    if serde_json::from_value::<MessageType>(serde_json::Value::String(
                        envelope.kind.clone(),
                    ))
                    .is_err() =>
                {
                    Err(MessageError::UnknownType(envelope.kind))
                }
                _ => Err(MessageError::Malformed(err)),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
