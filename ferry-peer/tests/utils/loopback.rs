use async_trait::async_trait;
use bytes::Bytes;
use ferry_core::SessionDescription;
use ferry_peer::{
    ConnectivityState, DataChannel, EventQueue, PeerTransport, TransportError, TransportEvent,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// One direction of an in-process data channel.
pub struct LoopbackChannel {
    label: String,
    peer_tx: mpsc::Sender<TransportEvent>,
    sent: Mutex<Vec<usize>>,
    closed: AtomicBool,
    delay: Mutex<Duration>,
}

impl LoopbackChannel {
    /// Makes every later send take `delay` before it is delivered.
    pub fn set_send_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Sizes of every message sent so far, in order.
    pub fn sent_sizes(&self) -> Vec<usize> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataChannel for LoopbackChannel {
    fn label(&self) -> &str {
        &self.label
    }

    async fn send(&self, data: Bytes) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::ChannelClosed);
        }
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(data.len());
        self.peer_tx
            .send(TransportEvent::Message(data))
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }

    async fn buffered_amount(&self) -> usize {
        0
    }

    async fn wait_buffered_below(&self, _threshold: usize) {}

    async fn close(&self) -> Result<(), TransportError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.peer_tx.send(TransportEvent::ChannelClosed).await;
        }
        Ok(())
    }
}

struct Link {
    event_txs: [mpsc::Sender<TransportEvent>; 2],
    channels: [Arc<LoopbackChannel>; 2],
    remotes_applied: AtomicUsize,
}

/// In-process transport. Connects once both sides have applied a remote
/// description, then opens one channel per side.
pub struct LoopbackTransport {
    side: usize,
    link: Arc<Link>,
    local: Mutex<Option<SessionDescription>>,
}

impl LoopbackTransport {
    /// This side's outgoing channel.
    pub fn channel(&self) -> Arc<LoopbackChannel> {
        self.link.channels[self.side].clone()
    }

    async fn set_local(&self, desc: SessionDescription) {
        *self.local.lock().unwrap() = Some(desc);
        let _ = self.link.event_txs[self.side]
            .send(TransportEvent::GatheringComplete)
            .await;
    }
}

pub fn loopback_pair() -> ((LoopbackTransport, EventQueue), (LoopbackTransport, EventQueue)) {
    let (tx_a, rx_a) = mpsc::channel(256);
    let (tx_b, rx_b) = mpsc::channel(256);

    let channel = |label: &str, peer_tx: &mpsc::Sender<TransportEvent>| {
        Arc::new(LoopbackChannel {
            label: label.to_owned(),
            peer_tx: peer_tx.clone(),
            sent: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            delay: Mutex::new(Duration::ZERO),
        })
    };
    let link = Arc::new(Link {
        channels: [channel("loopback-a", &tx_b), channel("loopback-b", &tx_a)],
        event_txs: [tx_a, tx_b],
        remotes_applied: AtomicUsize::new(0),
    });

    let side = |side: usize| LoopbackTransport {
        side,
        link: link.clone(),
        local: Mutex::new(None),
    };
    (
        (side(0), EventQueue::new(rx_a)),
        (side(1), EventQueue::new(rx_b)),
    )
}

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn create_offer(&self) -> Result<(), TransportError> {
        self.set_local(SessionDescription::offer(format!("v=0 loopback-{}", self.side)))
            .await;
        Ok(())
    }

    async fn create_answer(&self) -> Result<(), TransportError> {
        self.set_local(SessionDescription::answer(format!("v=0 loopback-{}", self.side)))
            .await;
        Ok(())
    }

    async fn set_remote_description(
        &self,
        _desc: SessionDescription,
    ) -> Result<(), TransportError> {
        if self.link.remotes_applied.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
            for side in 0..2 {
                let tx = &self.link.event_txs[side];
                let channel: Arc<dyn DataChannel> = self.link.channels[side].clone();
                let _ = tx
                    .send(TransportEvent::Connectivity(ConnectivityState::Connected))
                    .await;
                let _ = tx.send(TransportEvent::ChannelOpen(channel)).await;
            }
        }
        Ok(())
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.local.lock().unwrap().clone()
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.link.channels[self.side].close().await
    }
}
