//! Canonical trap payload encoding.
//!
//! A trap carries the whole reading as a single string varbind, so the
//! encoding has to be deterministic: the envelope keys appear in declaration
//! order (`ts` first, then `content`) and object keys inside the content are
//! emitted in sorted order. Identical inputs always produce identical bytes,
//! which keeps receiver-side parsing and golden tests stable.

use crate::core::PayloadEncoder;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Payload encoding failures.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to serialize trap payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The serialized envelope. Field order here is the wire order.
#[derive(Serialize)]
struct TrapPayload<'a> {
    ts: &'a str,
    content: &'a Value,
}

/// The one payload format the plugin emits: compact JSON with the reading
/// timestamp and content. No whitespace, no trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloadEncoder;

impl PayloadEncoder for JsonPayloadEncoder {
    fn encode(&self, ts: &str, content: &Value) -> Result<String, PayloadError> {
        Ok(serde_json::to_string(&TrapPayload { ts, content })?)
    }
}
