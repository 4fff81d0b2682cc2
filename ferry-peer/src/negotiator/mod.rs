mod negotiator;
mod phase;

pub use negotiator::*;
pub use phase::*;
