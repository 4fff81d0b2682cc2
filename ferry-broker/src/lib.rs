mod config;
mod error;
mod room;
mod signaling;

pub use config::BrokerConfig;
pub use error::{ProtocolError, RegistryError};
pub use room::*;
pub use signaling::*;
