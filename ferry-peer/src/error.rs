use crate::negotiator::{Phase, Wait};
use crate::transport::ConnectivityState;
use ferry_core::{DescriptionError, DescriptionKind, MessageType};
use std::time::Duration;
use thiserror::Error;

/// Failure inside the transport engine or on an open channel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("webrtc error: {0}")]
    Engine(#[from] webrtc::Error),

    #[error("no local description has been created")]
    NoLocalDescription,

    #[error("data channel is closed")]
    ChannelClosed,
}

/// Failure to move a session description between the peers.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to connect to signaling server {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("signaling connection closed")]
    Closed,

    #[error("signaling send queue full, {0} message not sent")]
    QueueFull(MessageType),

    #[error("timed out waiting for a signaling message")]
    TimedOut,

    #[error("signaling server error: {0}")]
    Server(String),

    #[error("the other peer left the room")]
    PeerLeft,

    #[error("unexpected {0} message")]
    Unexpected(MessageType),

    #[error("exchange used before it was opened")]
    NotOpened,

    #[error("input closed before a description was entered")]
    InputClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A failed negotiation. Every variant records the phase the attempt was in
/// and how long it had been running.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("timed out waiting for {waiting_for} in phase {phase} after {after:?}")]
    TimedOut {
        phase: Phase,
        waiting_for: Wait,
        after: Duration,
    },

    #[error("connection {state} in phase {phase} after {after:?}")]
    ConnectivityFailed {
        phase: Phase,
        state: ConnectivityState,
        after: Duration,
    },

    #[error("description exchange failed in phase {phase} after {after:?}: {source}")]
    Exchange {
        phase: Phase,
        after: Duration,
        #[source]
        source: ExchangeError,
    },

    #[error("transport failed in phase {phase} after {after:?}: {source}")]
    Transport {
        phase: Phase,
        after: Duration,
        #[source]
        source: TransportError,
    },

    #[error("invalid remote description in phase {phase} after {after:?}: {source}")]
    InvalidDescription {
        phase: Phase,
        after: Duration,
        #[source]
        source: DescriptionError,
    },

    #[error("expected {expected:?} description, got {actual:?} in phase {phase}")]
    UnexpectedDescription {
        phase: Phase,
        after: Duration,
        expected: DescriptionKind,
        actual: DescriptionKind,
    },

    #[error("transport event stream ended in phase {phase} after {after:?}")]
    EventsClosed { phase: Phase, after: Duration },
}

impl NegotiationError {
    pub fn phase(&self) -> Phase {
        match self {
            NegotiationError::TimedOut { phase, .. }
            | NegotiationError::ConnectivityFailed { phase, .. }
            | NegotiationError::Exchange { phase, .. }
            | NegotiationError::Transport { phase, .. }
            | NegotiationError::InvalidDescription { phase, .. }
            | NegotiationError::UnexpectedDescription { phase, .. }
            | NegotiationError::EventsClosed { phase, .. } => *phase,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, NegotiationError::TimedOut { .. })
    }
}

/// Failure while streaming the file over an open channel.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("malformed file metadata: {0}")]
    Metadata(#[source] serde_json::Error),

    #[error("metadata length {0} is out of range")]
    MetadataLength(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    #[error("channel closed after {received} of {expected} bytes")]
    ChannelClosed { received: u64, expected: u64 },

    #[error("channel closed before the file metadata arrived")]
    NoMetadata,

    #[error("transfer timed out after {0:?}")]
    TimedOut(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Everything a send or receive attempt can end with.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("{0} looks like an HTTP address; HTTP downloads are not supported")]
    HttpUnavailable(String),
}
