use crate::client::{EVENT_QUEUE_CAPACITY, generate_file_id};
use crate::codec::{
    FileSource, Progress, ProgressReporter, TransferSummary, send_file, wait_for_ack,
};
use crate::config::{ExchangeMode, PeerConfig};
use crate::error::{PeerError, TransferError};
use crate::exchange::{BrokerExchange, DescriptionExchange, ManualExchange, SignalingClient};
use crate::negotiator::Negotiator;
use crate::transport::{EventQueue, PeerTransport, WebRtcTransport};
use ferry_core::ClientRole;
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Sends one file to one receiver.
pub struct FileSender {
    path: PathBuf,
    file_id: String,
    config: PeerConfig,
    progress: watch::Sender<Progress>,
}

impl FileSender {
    pub fn new(path: impl Into<PathBuf>, config: PeerConfig) -> Self {
        Self {
            path: path.into(),
            file_id: generate_file_id(),
            config,
            progress: watch::channel(Progress::default()).0,
        }
    }

    pub fn with_file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = file_id.into();
        self
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Room the broker exchange uses: the configured one, else the file id.
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

    /// Runs a complete attempt on the webrtc engine with the configured
    /// exchange. The transport is closed on every exit path.
    pub async fn run(&self) -> Result<TransferSummary, PeerError> {
        let source = FileSource::open(&self.path).await?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let transport = WebRtcTransport::new(&self.config.transport, event_tx).await?;
        let events = EventQueue::new(event_rx);

        let result = match &self.config.exchange {
            ExchangeMode::Broker { url, .. } => match SignalingClient::connect(url).await {
                Ok(client) => {
                    let mut exchange =
                        BrokerExchange::new(client, self.room_id()).with_file_id(&self.file_id);
                    self.send_over(source, &transport, events, &mut exchange)
                        .await
                }
                Err(e) => Err(e.into()),
            },
            ExchangeMode::Manual => {
                let mut exchange = ManualExchange::stdio(Some(self.file_id.clone()), None);
                self.send_over(source, &transport, events, &mut exchange)
                    .await
            }
        };

        if let Err(e) = transport.close().await {
            warn!("Failed to close transport: {}", e);
        }
        result
    }

    /// Negotiates over `transport` and `exchange`, then streams `source`.
    ///
    /// The exchange is closed once negotiation ends; closing the transport
    /// is left to the caller.
    pub async fn send_over(
        &self,
        source: FileSource,
        transport: &dyn PeerTransport,
        events: EventQueue,
        exchange: &mut dyn DescriptionExchange,
    ) -> Result<TransferSummary, PeerError> {
        info!(
            "Offering {} as file id {}",
            self.path.display(),
            self.file_id
        );
        let timeouts = self.config.timeouts;
        let mut negotiator = Negotiator::new(ClientRole::Sender, transport, events, timeouts);

        let negotiated = negotiator.run(exchange).await;
        exchange.close().await;
        let negotiated = negotiated?;

        let mut progress = ProgressReporter::new(&self.progress);
        let transfer = send_file(
            negotiated.channel.as_ref(),
            source,
            self.config.chunk_size,
            &mut progress,
        );
        let mut result = match tokio::time::timeout(timeouts.transfer, transfer).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::TimedOut(timeouts.transfer)),
        };

        // The acknowledgment has its own bound, outside the transfer ceiling.
        if let Ok(summary) = &mut result {
            if summary.bytes > 0 {
                summary.acknowledged =
                    wait_for_ack(negotiator.events_mut(), timeouts.ack).await;
            }
        }

        match &result {
            Ok(_) => negotiator.complete(),
            Err(_) => negotiator.fail(),
        }
        debug!("Sender phases: {:?}", negotiator.history());
        Ok(result?)
    }
}
