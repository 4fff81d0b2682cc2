use crate::codec::Destination;
use crate::error::TransferError;
use ferry_core::FileMetadata;
use tracing::{debug, info, warn};

/// Length of the big-endian metadata length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest metadata body accepted.
pub const MAX_METADATA_LEN: u32 = 64 * 1024;

/// Which part of the stream the parser expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    AwaitingLengthPrefix,
    AwaitingMetadata { len: usize },
    ReceivingPayload,
    Complete,
}

/// What feeding a message achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    NeedMore,
    Complete,
}

/// Receiver-side parser for `[u32 length][metadata json][payload]`.
///
/// Message boundaries carry no meaning: every call consumes its input with a
/// cursor, moving through the states as many times as the bytes allow, so a
/// prefix, metadata body or state boundary may be split anywhere.
#[derive(Debug)]
pub struct ReceiveSession {
    state: ReceiveState,
    pending: Vec<u8>,
    metadata: Option<FileMetadata>,
    received: u64,
}

impl Default for ReceiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveSession {
    pub fn new() -> Self {
        Self {
            state: ReceiveState::AwaitingLengthPrefix,
            pending: Vec::with_capacity(LENGTH_PREFIX_LEN),
            metadata: None,
            received: 0,
        }
    }

    pub fn state(&self) -> ReceiveState {
        self.state
    }

    pub fn metadata(&self) -> Option<&FileMetadata> {
        self.metadata.as_ref()
    }

    /// Payload bytes written so far.
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn is_complete(&self) -> bool {
        self.state == ReceiveState::Complete
    }

    /// Consumes one channel message.
    pub async fn feed<D: Destination + ?Sized>(
        &mut self,
        data: &[u8],
        dest: &mut D,
    ) -> Result<FeedStatus, TransferError> {
        let mut cursor = data;

        while !cursor.is_empty() {
            match self.state {
                ReceiveState::AwaitingLengthPrefix => {
                    let take = (LENGTH_PREFIX_LEN - self.pending.len()).min(cursor.len());
                    self.pending.extend_from_slice(&cursor[..take]);
                    cursor = &cursor[take..];

                    if self.pending.len() == LENGTH_PREFIX_LEN {
                        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
                        prefix.copy_from_slice(&self.pending);
                        let len = u32::from_be_bytes(prefix);
                        if len == 0 || len > MAX_METADATA_LEN {
                            return Err(TransferError::MetadataLength(len));
                        }
                        debug!("Metadata length prefix: {} bytes", len);
                        self.pending.clear();
                        self.state = ReceiveState::AwaitingMetadata { len: len as usize };
                    }
                }
                ReceiveState::AwaitingMetadata { len } => {
                    let take = (len - self.pending.len()).min(cursor.len());
                    self.pending.extend_from_slice(&cursor[..take]);
                    cursor = &cursor[take..];

                    if self.pending.len() == len {
                        let metadata: FileMetadata = serde_json::from_slice(&self.pending)
                            .map_err(TransferError::Metadata)?;
                        self.pending = Vec::new();
                        info!(
                            "Incoming file {} ({} bytes)",
                            metadata.file_name, metadata.file_size
                        );
                        dest.open(&metadata).await?;
                        self.metadata = Some(metadata);
                        self.state = ReceiveState::ReceivingPayload;
                    }
                }
                ReceiveState::ReceivingPayload => {
                    let take = match self.expected_len() {
                        Some(expected) => {
                            let remaining = expected - self.received;
                            usize::try_from(remaining).map_or(cursor.len(), |r| r.min(cursor.len()))
                        }
                        None => cursor.len(),
                    };
                    dest.write(&cursor[..take]).await?;
                    self.received += take as u64;
                    cursor = &cursor[take..];

                    if self.expected_len() == Some(self.received) {
                        dest.finish().await?;
                        self.state = ReceiveState::Complete;
                    }
                }
                ReceiveState::Complete => {
                    warn!("Ignoring {} bytes past the declared size", cursor.len());
                    break;
                }
            }
        }

        Ok(match self.state {
            ReceiveState::Complete => FeedStatus::Complete,
            _ => FeedStatus::NeedMore,
        })
    }

    /// Handles the channel closing under the parser.
    ///
    /// A streaming transfer (declared size 0) ends here successfully; a
    /// sized one that is still short is an error.
    pub async fn close<D: Destination + ?Sized>(
        &mut self,
        dest: &mut D,
    ) -> Result<u64, TransferError> {
        match self.state {
            ReceiveState::Complete => Ok(self.received),
            ReceiveState::ReceivingPayload => match self.expected_len() {
                None => {
                    dest.finish().await?;
                    self.state = ReceiveState::Complete;
                    Ok(self.received)
                }
                Some(expected) => Err(TransferError::ChannelClosed {
                    received: self.received,
                    expected,
                }),
            },
            _ => Err(TransferError::NoMetadata),
        }
    }

    fn expected_len(&self) -> Option<u64> {
        self.metadata.as_ref().and_then(FileMetadata::expected_len)
    }
}
