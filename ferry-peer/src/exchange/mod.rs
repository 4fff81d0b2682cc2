mod broker_exchange;
mod description_exchange;
mod manual_exchange;
mod signaling_client;

pub use broker_exchange::*;
pub use description_exchange::*;
pub use manual_exchange::*;
pub use signaling_client::*;
