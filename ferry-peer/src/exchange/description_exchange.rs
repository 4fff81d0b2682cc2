use crate::error::ExchangeError;
use async_trait::async_trait;
use ferry_core::ClientRole;

/// A session description received from the other peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDescription {
    /// Base64 blob, still undecoded.
    pub blob: String,
    /// Transfer id announced alongside an offer, when the path carries one.
    pub file_id: Option<String>,
}

/// The capability of moving session descriptions between two peers.
///
/// The negotiator is written against this trait alone and bounds every
/// call with its own timeouts; implementations simply wait.
#[async_trait]
pub trait DescriptionExchange: Send {
    /// Announces this peer in `role`. For a broker this creates or joins the
    /// room and waits for the confirmation.
    async fn open(&mut self, role: ClientRole) -> Result<(), ExchangeError>;

    /// Sender only: resolves once a receiver is present.
    async fn wait_for_peer(&mut self) -> Result<(), ExchangeError>;

    async fn send_description(&mut self, blob: &str) -> Result<(), ExchangeError>;

    async fn receive_description(&mut self) -> Result<RemoteDescription, ExchangeError>;

    /// Releases whatever the exchange holds. Safe to call more than once.
    async fn close(&mut self) {}
}
