mod event_queue;
mod peer_transport;
mod transport_event;
mod webrtc_transport;

pub use event_queue::*;
pub use peer_transport::*;
pub use transport_event::*;
pub use webrtc_transport::*;
