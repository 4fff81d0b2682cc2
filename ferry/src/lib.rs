pub use ferry_core::{ClientRole, FileMetadata, SignalMessage};

pub mod model {
    pub use ferry_core::*;
}

#[cfg(feature = "broker")]
pub mod broker {
    pub use ferry_broker::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use ferry_peer::*;
}
