use crate::error::DescriptionError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    Offer,
    Answer,
}

/// A session description as produced by the transport engine.
///
/// Serialised as `{"type": "...", "sdp": "..."}` and then base64-encoded for
/// the `sdp` field of a signaling message or for manual copy-paste. The SDP
/// text itself is never interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: DescriptionKind::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn encode(&self) -> Result<String, DescriptionError> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(blob: &str) -> Result<Self, DescriptionError> {
        let blob = blob.trim();
        if blob.is_empty() {
            return Err(DescriptionError::Empty);
        }
        let json = STANDARD.decode(blob)?;
        Ok(serde_json::from_slice(&json)?)
    }
}
