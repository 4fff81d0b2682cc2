use crate::error::ExchangeError;
use crate::exchange::{DescriptionExchange, RemoteDescription};
use async_trait::async_trait;
use ferry_core::ClientRole;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};

/// Copy-paste exchange for when no broker is reachable.
///
/// Descriptions are printed for the human to hand over and the counterpart's
/// description is read back as one line of input. A receiver may be seeded
/// with the sender's offer up front, in which case nothing is read for it.
pub struct ManualExchange<R, W> {
    input: R,
    output: W,
    file_id: Option<String>,
    seeded: Option<String>,
    role: Option<ClientRole>,
}

impl ManualExchange<BufReader<Stdin>, Stdout> {
    pub fn stdio(file_id: Option<String>, seeded: Option<String>) -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), file_id)
            .with_seeded_description(seeded)
    }
}

impl<R, W> ManualExchange<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W, file_id: Option<String>) -> Self {
        Self {
            input,
            output,
            file_id,
            seeded: None,
            role: None,
        }
    }

    pub fn with_seeded_description(mut self, blob: Option<String>) -> Self {
        self.seeded = blob.map(|b| b.trim().to_owned()).filter(|b| !b.is_empty());
        self
    }

    async fn write(&mut self, text: &str) -> Result<(), ExchangeError> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn read_blob(&mut self) -> Result<String, ExchangeError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line).await? == 0 {
                return Err(ExchangeError::InputClosed);
            }
            let blob = line.trim();
            if !blob.is_empty() {
                return Ok(blob.to_owned());
            }
        }
    }

    fn role(&self) -> Result<ClientRole, ExchangeError> {
        self.role.ok_or(ExchangeError::NotOpened)
    }
}

#[async_trait]
impl<R, W> DescriptionExchange for ManualExchange<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn open(&mut self, role: ClientRole) -> Result<(), ExchangeError> {
        self.role = Some(role);
        Ok(())
    }

    async fn wait_for_peer(&mut self) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn send_description(&mut self, blob: &str) -> Result<(), ExchangeError> {
        let text = match self.role()? {
            ClientRole::Sender => {
                let file_id = self.file_id.as_deref().unwrap_or("-");
                format!(
                    "File id: {file_id}\n\
                     Give the receiver this offer:\n{blob}\n\n\
                     Paste the receiver's answer and press Enter:\n"
                )
            }
            ClientRole::Receiver => format!("Give the sender this answer:\n{blob}\n\n"),
        };
        self.write(&text).await
    }

    async fn receive_description(&mut self) -> Result<RemoteDescription, ExchangeError> {
        let role = self.role()?;
        let blob = match self.seeded.take() {
            Some(blob) => blob,
            None => {
                if role == ClientRole::Receiver {
                    self.write("Paste the sender's offer and press Enter:\n").await?;
                }
                self.read_blob().await?
            }
        };
        Ok(RemoteDescription {
            blob,
            file_id: self.file_id.clone(),
        })
    }
}
