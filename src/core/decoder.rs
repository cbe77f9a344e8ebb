//! Response decoding.
//!
//! One shared configuration for every endpoint: JSON via `serde_json`, with
//! timestamps as ISO-8601 (chrono's serde support). Any failure collapses to
//! [`NetworkError::DecodingFailed`]; the detail only reaches the log.

use serde::de::DeserializeOwned;

use crate::error::NetworkError;

/// Upper bound on how much of a raw payload is written to the log.
const MAX_LOGGED_PAYLOAD: usize = 4096;

/// Converts raw bytes into a typed value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseDecoder;

impl ResponseDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode `bytes` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::DecodingFailed`] on malformed JSON, missing
    /// required fields, or type mismatches.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, NetworkError> {
        serde_json::from_slice(bytes).map_err(|err| {
            tracing::error!(
                error = %err,
                line = err.line(),
                column = err.column(),
                target_type = std::any::type_name::<T>(),
                "decoding error"
            );
            tracing::error!(raw = %truncate(&String::from_utf8_lossy(bytes)), "raw JSON");
            NetworkError::DecodingFailed
        })
    }
}

fn truncate(text: &str) -> &str {
    if text.len() <= MAX_LOGGED_PAYLOAD {
        return text;
    }
    let mut end = MAX_LOGGED_PAYLOAD;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
