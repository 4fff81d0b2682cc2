use serde::{Deserialize, Serialize};

/// Header sent ahead of the payload on the data channel.
///
/// `file_size == 0` means the size is unknown and the payload runs until the
/// channel closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "fileSize")]
    pub file_size: i64,
}

impl FileMetadata {
    pub fn new(file_name: impl Into<String>, file_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            file_size: i64::try_from(file_size).unwrap_or(i64::MAX),
        }
    }

    /// Declared payload length, `None` when streaming.
    pub fn expected_len(&self) -> Option<u64> {
        u64::try_from(self.file_size).ok().filter(|len| *len > 0)
    }
}

/// Application-level acknowledgment the receiver sends after the last byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferAck {
    #[serde(rename = "type")]
    pub kind: String,
}

impl TransferAck {
    pub const FILE_RECEIVED: &'static str = "file_received";

    pub fn file_received() -> Self {
        Self {
            kind: Self::FILE_RECEIVED.to_owned(),
        }
    }

    /// True when `data` is a `file_received` acknowledgment.
    pub fn matches(data: &[u8]) -> bool {
        serde_json::from_slice::<TransferAck>(data)
            .map(|ack| ack.kind == Self::FILE_RECEIVED)
            .unwrap_or(false)
    }
}
