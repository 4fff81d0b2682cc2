use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::transport::{
    ConnectivityState, DATA_CHANNEL_LABEL, DataChannel, PeerTransport, TransportEvent,
};
use async_trait::async_trait;
use bytes::Bytes;
use ferry_core::{DescriptionKind, SessionDescription};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::RTCIceCandidate;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

/// Queued bytes at which the channel reports it has drained.
const BUFFERED_LOW_THRESHOLD: usize = 256 * 1024;

/// How often a drain wait re-checks in case a low-water callback was missed.
const DRAIN_POLL: Duration = Duration::from_millis(100);

/// [`PeerTransport`] backed by a webrtc-rs peer connection.
pub struct WebRtcTransport {
    peer_connection: Arc<RTCPeerConnection>,
    event_tx: mpsc::Sender<TransportEvent>,
}

impl WebRtcTransport {
    /// Creates the peer connection and wires its callbacks to `event_tx`.
    pub async fn new(
        config: &TransportConfig,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self, TransportError> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone(),
                    credential: server.credential.clone(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    let _ = tx.send(TransportEvent::Connectivity(map_state(s))).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                match c {
                    Some(candidate) => {
                        debug!("Gathered candidate {}:{}", candidate.address, candidate.port)
                    }
                    None => {
                        debug!("Candidate gathering complete");
                        let _ = tx.send(TransportEvent::GatheringComplete).await;
                    }
                }
            })
        }));

        // Answering side: the channel is announced by the offerer.
        let dc_tx = event_tx.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            let tx = dc_tx.clone();
            Box::pin(async move {
                debug!("Remote data channel '{}' announced", dc.label());
                wire_channel(dc, tx).await;
            })
        }));

        Ok(Self {
            peer_connection,
            event_tx,
        })
    }
}

#[async_trait]
impl PeerTransport for WebRtcTransport {
    async fn create_offer(&self) -> Result<(), TransportError> {
        let init = RTCDataChannelInit {
            ordered: Some(true),
            ..Default::default()
        };
        let dc = self
            .peer_connection
            .create_data_channel(DATA_CHANNEL_LABEL, Some(init))
            .await?;
        wire_channel(dc, self.event_tx.clone()).await;

        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection.set_local_description(offer).await?;
        Ok(())
    }

    async fn create_answer(&self) -> Result<(), TransportError> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection.set_local_description(answer).await?;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        desc: SessionDescription,
    ) -> Result<(), TransportError> {
        let desc = match desc.kind {
            DescriptionKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            DescriptionKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        let desc = self.peer_connection.local_description().await?;
        match desc.sdp_type {
            RTCSdpType::Offer => Some(SessionDescription::offer(desc.sdp)),
            RTCSdpType::Answer => Some(SessionDescription::answer(desc.sdp)),
            other => {
                warn!("Ignoring local description of type {}", other);
                None
            }
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

fn map_state(s: RTCPeerConnectionState) -> ConnectivityState {
    match s {
        RTCPeerConnectionState::Connecting => ConnectivityState::Checking,
        RTCPeerConnectionState::Connected => ConnectivityState::Connected,
        RTCPeerConnectionState::Disconnected => ConnectivityState::Disconnected,
        RTCPeerConnectionState::Failed => ConnectivityState::Failed,
        RTCPeerConnectionState::Closed => ConnectivityState::Closed,
        _ => ConnectivityState::New,
    }
}

/// Forwards a channel's lifecycle and messages to `tx`.
async fn wire_channel(dc: Arc<RTCDataChannel>, tx: mpsc::Sender<TransportEvent>) {
    let channel = Arc::new(WebRtcDataChannel::new(dc.clone()));

    dc.set_buffered_amount_low_threshold(BUFFERED_LOW_THRESHOLD)
        .await;
    let drained = channel.drained.clone();
    dc.on_buffered_amount_low(Box::new(move || {
        let drained = drained.clone();
        Box::pin(async move {
            drained.notify_one();
        })
    }))
    .await;

    let tx_open = tx.clone();
    let ready: Arc<dyn DataChannel> = channel;
    dc.on_open(Box::new(move || {
        Box::pin(async move {
            info!("Data channel '{}' open", ready.label());
            let _ = tx_open.send(TransportEvent::ChannelOpen(ready)).await;
        })
    }));

    let tx_msg = tx.clone();
    dc.on_message(Box::new(move |msg: DataChannelMessage| {
        let tx = tx_msg.clone();
        Box::pin(async move {
            let _ = tx.send(TransportEvent::Message(msg.data)).await;
        })
    }));

    let tx_close = tx;
    dc.on_close(Box::new(move || {
        let tx = tx_close.clone();
        Box::pin(async move {
            info!("Data channel closed");
            let _ = tx.send(TransportEvent::ChannelClosed).await;
        })
    }));
}

/// [`DataChannel`] over an `RTCDataChannel`.
pub struct WebRtcDataChannel {
    inner: Arc<RTCDataChannel>,
    drained: Arc<Notify>,
}

impl WebRtcDataChannel {
    fn new(inner: Arc<RTCDataChannel>) -> Self {
        Self {
            inner,
            drained: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl DataChannel for WebRtcDataChannel {
    fn label(&self) -> &str {
        self.inner.label()
    }

    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        self.inner.send(&data).await?;
        Ok(())
    }

    async fn buffered_amount(&self) -> usize {
        self.inner.buffered_amount().await
    }

    async fn wait_buffered_below(&self, threshold: usize) {
        while self.inner.buffered_amount().await > threshold {
            let _ = tokio::time::timeout(DRAIN_POLL, self.drained.notified()).await;
        }
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.inner.close().await?;
        Ok(())
    }
}
