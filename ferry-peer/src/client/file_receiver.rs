use crate::client::{EVENT_QUEUE_CAPACITY, ReceiveTarget, classify_address};
use crate::codec::{
    FileDestination, Progress, ProgressReporter, SaveLocation, TransferSummary, receive_file,
};
use crate::config::{ExchangeMode, PeerConfig};
use crate::error::{PeerError, TransferError};
use crate::exchange::{BrokerExchange, DescriptionExchange, ManualExchange, SignalingClient};
use crate::negotiator::Negotiator;
use crate::transport::{EventQueue, PeerTransport, WebRtcTransport};
use ferry_core::ClientRole;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// How long the acknowledgment gets to leave before the connection closes.
const ACK_LINGER: Duration = Duration::from_millis(500);

/// Receives one file from one sender.
pub struct FileReceiver {
    file_id: String,
    offer: Option<String>,
    location: SaveLocation,
    config: PeerConfig,
    progress: watch::Sender<Progress>,
}

impl FileReceiver {
    pub fn new(file_id: impl Into<String>, location: SaveLocation, config: PeerConfig) -> Self {
        Self {
            file_id: file_id.into(),
            offer: None,
            location,
            config,
            progress: watch::channel(Progress::default()).0,
        }
    }

    /// Builds a receiver from a `receive` address, see [`classify_address`].
    pub fn from_address(
        address: &str,
        location: SaveLocation,
        config: PeerConfig,
    ) -> Result<Self, PeerError> {
        match classify_address(address) {
            ReceiveTarget::Http(url) => Err(PeerError::HttpUnavailable(url)),
            ReceiveTarget::Transfer { file_id, offer } => {
                Ok(Self::new(file_id, location, config).with_offer(offer))
            }
        }
    }

    /// Seeds the sender's offer. A seeded receiver never uses the broker.
    pub fn with_offer(mut self, offer: Option<String>) -> Self {
        self.offer = offer;
        self
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn room_id(&self) -> &str {
        match &self.config.exchange {
            ExchangeMode::Broker {
                room_id: Some(room),
                ..
            } => room,
            _ => &self.file_id,
        }
    }

    pub fn progress(&self) -> watch::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// Runs a complete attempt on the webrtc engine. The transport is closed
    /// on every exit path.
    pub async fn run(&self) -> Result<TransferSummary, PeerError> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let transport = WebRtcTransport::new(&self.config.transport, event_tx).await?;
        let events = EventQueue::new(event_rx);

        let result = match (&self.offer, &self.config.exchange) {
            (None, ExchangeMode::Broker { url, .. }) => {
                match SignalingClient::connect(url).await {
                    Ok(client) => {
                        let mut exchange = BrokerExchange::new(client, self.room_id());
                        self.receive_over(&transport, events, &mut exchange).await
                    }
                    Err(e) => Err(e.into()),
                }
            }
            (offer, _) => {
                let mut exchange = ManualExchange::stdio(Some(self.file_id.clone()), offer.clone());
                self.receive_over(&transport, events, &mut exchange).await
            }
        };

        if let Err(e) = transport.close().await {
            warn!("Failed to close transport: {}", e);
        }
        result
    }

    /// Negotiates over `transport` and `exchange`, then writes the incoming
    /// file under the save location.
    pub async fn receive_over(
        &self,
        transport: &dyn PeerTransport,
        events: EventQueue,
        exchange: &mut dyn DescriptionExchange,
    ) -> Result<TransferSummary, PeerError> {
        info!("Receiving file id {}", self.file_id);
        let timeouts = self.config.timeouts;
        let mut negotiator = Negotiator::new(ClientRole::Receiver, transport, events, timeouts);

        let negotiated = negotiator.run(exchange).await;
        exchange.close().await;
        let negotiated = negotiated?;
        if let Some(file_id) = &negotiated.file_id {
            debug!("Sender announced file id {}", file_id);
        }

        let mut dest = FileDestination::new(self.location.clone());
        let mut progress = ProgressReporter::new(&self.progress);
        let channel = negotiated.channel.as_ref();
        let transfer = receive_file(channel, negotiator.events_mut(), &mut dest, &mut progress);
        let result = match tokio::time::timeout(timeouts.transfer, transfer).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::TimedOut(timeouts.transfer)),
        };

        match &result {
            Ok(_) => {
                negotiator.complete();
                let _ = tokio::time::timeout(ACK_LINGER, channel.wait_buffered_below(0)).await;
                tokio::time::sleep(ACK_LINGER).await;
            }
            Err(_) => negotiator.fail(),
        }
        debug!("Receiver phases: {:?}", negotiator.history());
        Ok(result?)
    }
}
