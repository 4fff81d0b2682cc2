use crate::error::ExchangeError;
use ferry_core::SignalMessage;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Outbound and inbound queue depth.
pub const SIGNALING_QUEUE_CAPACITY: usize = 256;

/// Turns a user-supplied signaling address into a WebSocket URL.
///
/// `http` becomes `ws`, `https` becomes `wss`, and an address without a
/// scheme is taken as `ws://`.
pub fn normalize_signaling_url(url: &str) -> String {
    let url = url.trim();
    if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if url.contains("://") {
        url.to_owned()
    } else {
        format!("ws://{url}")
    }
}

/// A peer's connection to the signaling broker.
///
/// Reading and writing run as two tasks; this handle only talks to them
/// through queues.
pub struct SignalingClient {
    outbound: Option<mpsc::Sender<SignalMessage>>,
    inbound: mpsc::Receiver<SignalMessage>,
    read_task: JoinHandle<()>,
    write_task: Option<JoinHandle<()>>,
}

impl SignalingClient {
    pub async fn connect(url: &str) -> Result<Self, ExchangeError> {
        let url = normalize_signaling_url(url);
        let (socket, _) = connect_async(url.as_str())
            .await
            .map_err(|source| ExchangeError::Connect {
                url: url.clone(),
                source,
            })?;
        info!("Connected to signaling server {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outbound_tx, mut outbound_rx) =
            mpsc::channel::<SignalMessage>(SIGNALING_QUEUE_CAPACITY);
        let (inbound_tx, inbound_rx) = mpsc::channel(SIGNALING_QUEUE_CAPACITY);

        let write_task = tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to serialize signaling message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!("Failed to send signaling message: {}", e);
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        let read_task = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Signaling read error: {}", e);
                        break;
                    }
                };
                match SignalMessage::parse(text.as_str()) {
                    Ok(msg) => {
                        if inbound_tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring unreadable signaling message: {}", e),
                }
            }
            debug!("Signaling read loop finished");
        });

        Ok(Self {
            outbound: Some(outbound_tx),
            inbound: inbound_rx,
            read_task,
            write_task: Some(write_task),
        })
    }

    /// Queues `msg` without waiting. A full queue is an error, the message
    /// is not sent.
    pub fn send(&self, msg: SignalMessage) -> Result<(), ExchangeError> {
        let outbound = self.outbound.as_ref().ok_or(ExchangeError::Closed)?;
        match outbound.try_send(msg) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!("Signaling send queue full, dropping {}", msg.kind);
                Err(ExchangeError::QueueFull(msg.kind))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ExchangeError::Closed),
        }
    }

    /// Next message from the broker.
    pub async fn recv(&mut self) -> Result<SignalMessage, ExchangeError> {
        self.inbound.recv().await.ok_or(ExchangeError::Closed)
    }

    pub async fn receive(&mut self, timeout: Duration) -> Result<SignalMessage, ExchangeError> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| ExchangeError::TimedOut)?
    }

    /// Sends a close frame and stops both tasks.
    pub async fn close(&mut self) {
        self.outbound.take();
        if let Some(write_task) = self.write_task.take() {
            let _ = tokio::time::timeout(Duration::from_secs(1), write_task).await;
        }
        self.read_task.abort();
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.read_task.abort();
        if let Some(write_task) = &self.write_task {
            write_task.abort();
        }
    }
}
