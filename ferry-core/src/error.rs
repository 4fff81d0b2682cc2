use thiserror::Error;

/// Failure to turn a signaling frame into a [`crate::SignalMessage`].
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("invalid message format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown message type: {0}")]
    UnknownType(String),
}

/// Failure to decode a session description blob.
#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("description is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("description is not a valid session description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("description is empty")]
    Empty,
}
