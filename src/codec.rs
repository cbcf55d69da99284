//! Payload encoding
//!
//! Converts an alert into transport-agnostic bytes. Encoding failures are
//! reported as [`OutputError::Serialization`] so callers can tell them apart
//! from transport failures.

use crate::error::{OutputError, Result};
use crate::types::Event;
use bytes::Bytes;

/// Encodes alerts into publishable payloads
pub trait PayloadCodec: Send + Sync {
    /// MIME type of the produced payload
    fn content_type(&self) -> &str;

    /// Encode the full alert; no field is dropped or summarised
    fn encode(&self, event: &Event) -> Result<Bytes>;
}

/// Canonical JSON encoding of the full alert
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn content_type(&self) -> &str {
        "application/json"
    }

    fn encode(&self, event: &Event) -> Result<Bytes> {
        serde_json::to_vec(event)
            .map(Bytes::from)
            .map_err(|e| OutputError::Serialization(e.to_string()))
    }
}
