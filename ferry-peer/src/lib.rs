//! Peer side of a ferry transfer.
//!
//! A transfer attempt runs in two stages. The [`Negotiator`] drives a
//! [`PeerTransport`] through the offer/answer handshake, using a
//! [`DescriptionExchange`] to move session descriptions between the peers,
//! until a data channel opens. The codec then streams the file over that
//! channel. [`FileSender`] and [`FileReceiver`] compose the two.

mod client;
mod codec;
mod config;
mod error;
mod exchange;
mod negotiator;
mod transport;

pub use client::*;
pub use codec::*;
pub use config::*;
pub use error::*;
pub use exchange::*;
pub use negotiator::*;
pub use transport::*;
