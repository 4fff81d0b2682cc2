mod connection;
mod description;
mod metadata;
mod role;
mod signaling;

pub use connection::ConnectionId;
pub use description::{DescriptionKind, SessionDescription};
pub use metadata::{FileMetadata, TransferAck};
pub use role::ClientRole;
pub use signaling::{MessageType, SignalMessage};
