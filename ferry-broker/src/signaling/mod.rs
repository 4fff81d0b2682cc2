mod broker;
mod connection;
mod server;
mod ws_handler;

pub use broker::*;
pub use connection::*;
pub use server::*;
pub use ws_handler::*;
