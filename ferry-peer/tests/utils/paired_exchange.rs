use async_trait::async_trait;
use ferry_core::ClientRole;
use ferry_peer::{DescriptionExchange, ExchangeError, RemoteDescription};
use tokio::sync::mpsc;

/// In-memory description exchange; what one side sends the other receives.
pub struct PairedExchange {
    tx: mpsc::Sender<RemoteDescription>,
    rx: mpsc::Receiver<RemoteDescription>,
    file_id: Option<String>,
    opened: Option<ClientRole>,
}

pub fn exchange_pair(file_id: &str) -> (PairedExchange, PairedExchange) {
    let (tx_a, rx_a) = mpsc::channel(4);
    let (tx_b, rx_b) = mpsc::channel(4);
    let side = |tx, rx| PairedExchange {
        tx,
        rx,
        file_id: Some(file_id.to_owned()),
        opened: None,
    };
    (side(tx_b, rx_a), side(tx_a, rx_b))
}

impl PairedExchange {
    pub fn opened_as(&self) -> Option<ClientRole> {
        self.opened
    }
}

#[async_trait]
impl DescriptionExchange for PairedExchange {
    async fn open(&mut self, role: ClientRole) -> Result<(), ExchangeError> {
        self.opened = Some(role);
        Ok(())
    }

    async fn wait_for_peer(&mut self) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn send_description(&mut self, blob: &str) -> Result<(), ExchangeError> {
        self.tx
            .send(RemoteDescription {
                blob: blob.to_owned(),
                file_id: self.file_id.clone(),
            })
            .await
            .map_err(|_| ExchangeError::Closed)
    }

    async fn receive_description(&mut self) -> Result<RemoteDescription, ExchangeError> {
        self.rx.recv().await.ok_or(ExchangeError::Closed)
    }
}
