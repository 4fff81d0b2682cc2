use ferry_core::{ClientRole, MessageError, MessageType};
use thiserror::Error;

/// Problems with what a client asked for. Reported back to that client as an
/// `error` message; the connection stays open.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("room id must not be empty")]
    InvalidRoomId,

    #[error("room {0} already exists")]
    RoomExists(String),

    #[error("room {0} does not exist")]
    RoomNotFound(String),

    #[error("not in a room")]
    NotInRoom,

    #[error("already in room {0}")]
    AlreadyInRoom(String),

    #[error("only the {required} may send {action}")]
    WrongRole {
        action: MessageType,
        required: ClientRole,
    },

    #[error("{0} is a server message and cannot be sent by clients")]
    ServerOnly(MessageType),

    #[error("invalid message format: {0}")]
    Malformed(String),

    #[error("unknown message type: {0}")]
    UnknownType(String),

    #[error("binary frames are not supported")]
    BinaryFrame,
}

impl From<MessageError> for ProtocolError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::Malformed(e) => ProtocolError::Malformed(e.to_string()),
            MessageError::UnknownType(t) => ProtocolError::UnknownType(t),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("room {0} already exists")]
    DuplicateRoom(String),
}
