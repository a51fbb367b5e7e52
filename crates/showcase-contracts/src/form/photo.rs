use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

const BASE64_MARKER: &str = ";base64,";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhotoError {
    #[error("generated photo payload is empty")]
    Empty,
    #[error("generated photo payload is not valid base64: {0}")]
    InvalidBase64(String),
    #[error("photo is not a base64 data URI")]
    NotDataUri,
}

/// An image embedded inline as a `data:<media-type>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Photo(String);

impl Photo {
    /// Wraps the bare base64 bytes returned by the generation endpoint. The
    /// payload is prefixed as-is.
    pub fn from_jpeg_base64(payload: &str) -> Result<Self, PhotoError> {
        if payload.is_empty() {
            return Err(PhotoError::Empty);
        }
        BASE64
            .decode(payload)
            .map_err(|err| PhotoError::InvalidBase64(err.to_string()))?;
        Ok(Self(format!("{JPEG_DATA_URI_PREFIX}{payload}")))
    }

    /// Accepts whatever the user put in the photo field. Not validated.
    pub fn from_data_uri(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_data_uri(&self) -> &str {
        &self.0
    }

    pub fn media_type(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let end = rest.find(BASE64_MARKER)?;
        Some(&rest[..end])
    }

    pub fn base64_payload(&self) -> Option<&str> {
        let start = self.0.find(BASE64_MARKER)? + BASE64_MARKER.len();
        if !self.0.starts_with("data:") {
            return None;
        }
        Some(&self.0[start..])
    }

    pub fn decode(&self) -> Result<Vec<u8>, PhotoError> {
        let payload = self.base64_payload().ok_or(PhotoError::NotDataUri)?;
        BASE64
            .decode(payload)
            .map_err(|err| PhotoError::InvalidBase64(err.to_string()))
    }
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
