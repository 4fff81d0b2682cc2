pub mod loopback;
pub mod paired_exchange;

pub use loopback::*;
pub use paired_exchange::*;
