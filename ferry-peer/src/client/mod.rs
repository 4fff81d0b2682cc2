mod address;
mod file_receiver;
mod file_sender;

pub use address::*;
pub use file_receiver::*;
pub use file_sender::*;

/// Depth of the transport event queue between engine callbacks and the
/// session driver.
pub const EVENT_QUEUE_CAPACITY: usize = 256;
