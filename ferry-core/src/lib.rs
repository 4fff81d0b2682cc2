pub mod error;
pub mod model;

pub use error::{DescriptionError, MessageError};
pub use model::*;
