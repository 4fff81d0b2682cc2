use anyhow::{Context, Result};
use ferry_core::{MessageType, SignalMessage};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a reply the test expects to arrive (ms).
pub const REPLY_TIMEOUT_MS: u64 = 2000;

/// How long to listen before concluding nothing is coming (ms).
pub const SILENCE_MS: u64 = 200;

/// Raw WebSocket client speaking the signaling protocol.
pub struct WsTestClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsTestClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (socket, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("Failed to connect to broker")?;
        Ok(Self { socket })
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        self.send_text(msg.to_json()?).await
    }

    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<()> {
        let text: String = text.into();
        self.socket
            .send(Message::Text(text.into()))
            .await
            .context("Failed to send frame")
    }

    /// Next signaling message, skipping control frames.
    pub async fn recv(&mut self) -> Result<SignalMessage> {
        let deadline = Duration::from_millis(REPLY_TIMEOUT_MS);
        loop {
            let frame = tokio::time::timeout(deadline, self.socket.next())
                .await
                .context("Timeout waiting for a message")?
                .context("Connection closed")??;
            match frame {
                Message::Text(text) => return Ok(SignalMessage::parse(text.as_str())?),
                Message::Close(_) => anyhow::bail!("Connection closed by broker"),
                _ => continue,
            }
        }
    }

    /// Next raw frame, control frames included.
    pub async fn next_frame(&mut self) -> Result<Message> {
        let deadline = Duration::from_millis(REPLY_TIMEOUT_MS);
        let frame = tokio::time::timeout(deadline, self.socket.next())
            .await
            .context("Timeout waiting for a frame")?
            .context("Connection closed")??;
        Ok(frame)
    }

    pub async fn expect(&mut self, kind: MessageType) -> Result<SignalMessage> {
        let msg = self.recv().await?;
        anyhow::ensure!(msg.kind == kind, "expected {kind}, got {:?}", msg);
        Ok(msg)
    }

    /// Asserts that no signaling message arrives for a short while.
    pub async fn expect_silence(&mut self) -> Result<()> {
        let window = Duration::from_millis(SILENCE_MS);
        match tokio::time::timeout(window, self.socket.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => {
                anyhow::bail!("unexpected message: {}", text.as_str())
            }
            Ok(_) => Ok(()),
        }
    }

    pub async fn create_room(addr: SocketAddr, room: &str) -> Result<Self> {
        let mut client = Self::connect(addr).await?;
        client.send(&SignalMessage::create_room(room)).await?;
        client.expect(MessageType::RoomCreated).await?;
        Ok(client)
    }

    pub async fn join_room(addr: SocketAddr, room: &str) -> Result<Self> {
        let mut client = Self::connect(addr).await?;
        client.send(&SignalMessage::join_room(room)).await?;
        client.expect(MessageType::RoomJoined).await?;
        Ok(client)
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
