use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a connection takes inside a room.
///
/// The creator of a room is always the `Sender`, every joiner a `Receiver`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Sender,
    Receiver,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Sender => "sender",
            ClientRole::Receiver => "receiver",
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
