use crate::error::TransportError;
use async_trait::async_trait;
use bytes::Bytes;
use ferry_core::SessionDescription;

/// Label of the single data channel a transfer uses.
pub const DATA_CHANNEL_LABEL: &str = "fileTransfer";

/// The transport engine as the negotiator sees it.
///
/// Everything asynchronous the engine reports (gathering, connectivity,
/// channel lifecycle, messages) arrives as [`crate::TransportEvent`]s on the
/// channel handed to the engine at construction.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Creates the ordered, reliable data channel and the local offer.
    async fn create_offer(&self) -> Result<(), TransportError>;

    /// Creates the local answer to an already applied remote offer.
    async fn create_answer(&self) -> Result<(), TransportError>;

    async fn set_remote_description(&self, desc: SessionDescription)
    -> Result<(), TransportError>;

    /// The current local description, including whatever candidates have
    /// been gathered so far.
    async fn local_description(&self) -> Option<SessionDescription>;

    async fn close(&self) -> Result<(), TransportError>;
}

/// An open message channel between the two peers.
#[async_trait]
pub trait DataChannel: Send + Sync {
    fn label(&self) -> &str;

    /// Queues one message. Never splits or merges messages.
    async fn send(&self, data: Bytes) -> Result<(), TransportError>;

    /// Bytes queued locally but not yet handed to the network.
    async fn buffered_amount(&self) -> usize;

    /// Resolves once at most `threshold` bytes are queued.
    async fn wait_buffered_below(&self, threshold: usize);

    async fn close(&self) -> Result<(), TransportError>;
}
