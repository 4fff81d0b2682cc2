use crate::transport::DataChannel;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

/// Connection state as reported by the transport engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    New,
    Checking,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectivityState {
    /// States that end a negotiation or transfer on the spot.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            ConnectivityState::Disconnected | ConnectivityState::Failed | ConnectivityState::Closed
        )
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectivityState::New => "new",
            ConnectivityState::Checking => "checking",
            ConnectivityState::Connected => "connected",
            ConnectivityState::Disconnected => "disconnected",
            ConnectivityState::Failed => "failed",
            ConnectivityState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Events the transport engine emits for the session driving it.
#[derive(Clone)]
pub enum TransportEvent {
    /// Local candidate gathering finished; the local description is final.
    GatheringComplete,

    Connectivity(ConnectivityState),

    /// The data channel is open and ready for writing.
    ChannelOpen(Arc<dyn DataChannel>),

    /// One message received on the data channel.
    Message(Bytes),

    ChannelClosed,
}

/// Discriminant of a [`TransportEvent`], for selective waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    GatheringComplete,
    Connectivity,
    ChannelOpen,
    Message,
    ChannelClosed,
}

impl TransportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            TransportEvent::GatheringComplete => EventKind::GatheringComplete,
            TransportEvent::Connectivity(_) => EventKind::Connectivity,
            TransportEvent::ChannelOpen(_) => EventKind::ChannelOpen,
            TransportEvent::Message(_) => EventKind::Message,
            TransportEvent::ChannelClosed => EventKind::ChannelClosed,
        }
    }
}

impl fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportEvent::GatheringComplete => f.write_str("GatheringComplete"),
            TransportEvent::Connectivity(state) => write!(f, "Connectivity({state})"),
            TransportEvent::ChannelOpen(channel) => write!(f, "ChannelOpen({})", channel.label()),
            TransportEvent::Message(data) => write!(f, "Message({} bytes)", data.len()),
            TransportEvent::ChannelClosed => f.write_str("ChannelClosed"),
        }
    }
}
