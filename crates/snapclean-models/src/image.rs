//! Opaque image payloads.
//!
//! Images travel through the system as strings: either a `data:` URI carrying
//! the base64-encoded file, or a remote `http(s)` URL returned by a provider.
//! Nothing in the workspace decodes pixels.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Largest accepted upload (10 MiB of decoded image bytes).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Encoded image (data URI or URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Wrap an existing data URI or URL.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Encode raw file bytes as a base64 data URI.
    pub fn from_bytes(bytes: &[u8], media_type: &str) -> Self {
        Self(format!("data:{};base64,{}", media_type, STANDARD.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Whether the payload references a remote image.
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }

    /// MIME type of a data URI (`None` for URLs and unrecognized payloads).
    pub fn media_type(&self) -> Option<&str> {
        let (header, _) = self.split_data_uri()?;
        let media_type = header.split(';').next().unwrap_or_default();
        if media_type.is_empty() {
            None
        } else {
            Some(media_type)
        }
    }

    /// Raw bytes of a base64 data URI.
    pub fn decode_bytes(&self) -> ModelResult<Vec<u8>> {
        STANDARD
            .decode(self.base64_data()?)
            .map_err(|e| ModelError::MalformedDataUri(e.to_string()))
    }

    /// Decoded size of a base64 data URI, computed from the encoded length.
    pub fn decoded_len(&self) -> ModelResult<usize> {
        let data = self.base64_data()?;
        if data.len() % 4 != 0 {
            return Err(ModelError::MalformedDataUri(
                "base64 length is not a multiple of 4".to_string(),
            ));
        }
        let padding = data.bytes().rev().take(2).take_while(|&b| b == b'=').count();
        Ok(data.len() / 4 * 3 - padding)
    }

    /// Check the base64 alphabet and padding without materializing the bytes.
    fn check_base64(&self) -> ModelResult<()> {
        const CHUNK: usize = 4096;
        let mut buf = [0u8; CHUNK / 4 * 3];
        for chunk in self.base64_data()?.as_bytes().chunks(CHUNK) {
            STANDARD
                .decode_slice(chunk, &mut buf)
                .map_err(|e| ModelError::MalformedDataUri(e.to_string()))?;
        }
        Ok(())
    }

    fn base64_data(&self) -> ModelResult<&str> {
        let (header, data) = self
            .split_data_uri()
            .ok_or_else(|| ModelError::MalformedDataUri("not a data URI".to_string()))?;

        if !header.split(';').any(|part| part == "base64") {
            return Err(ModelError::MalformedDataUri(
                "only base64 data URIs are supported".to_string(),
            ));
        }

        Ok(data.trim())
    }

    /// Validate an uploaded image: non-empty, an `image/*` data URI no larger
    /// than `max_bytes`, or a remote URL.
    pub fn validate_upload(&self, max_bytes: usize) -> ModelResult<()> {
        if self.is_empty() {
            return Err(ModelError::EmptyPayload);
        }

        if self.is_remote() {
            return Ok(());
        }

        if self.split_data_uri().is_none() {
            return Err(ModelError::MalformedDataUri(
                "expected a data: URI or an http(s) URL".to_string(),
            ));
        }

        match self.media_type() {
            Some(mt) if mt.starts_with("image/") => {}
            Some(mt) => return Err(ModelError::NotAnImage(mt.to_string())),
            None => return Err(ModelError::NotAnImage("unknown media type".to_string())),
        }

        let size = self.decoded_len()?;
        if size > max_bytes {
            return Err(ModelError::TooLarge {
                size,
                max: max_bytes,
            });
        }

        self.check_base64()
    }

    fn split_data_uri(&self) -> Option<(&str, &str)> {
        self.0.strip_prefix("data:")?.split_once(',')
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URIs can be megabytes long; keep logs readable.
        if self.0.len() > 64 {
            let head: String = self.0.chars().take(48).collect();
            write!(f, "{}... ({} chars)", head, self.0.len())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl From<String> for ImagePayload {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ImagePayload {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
