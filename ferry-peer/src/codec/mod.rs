mod destination;
mod progress;
mod receive_session;
mod receiver;
mod sender;

pub use destination::*;
pub use progress::*;
pub use receive_session::*;
pub use receiver::*;
pub use sender::*;
