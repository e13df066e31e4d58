//! Protocol-level errors.
//!
//! None of these are fatal to a conversion: a record that fails validation
//! is dropped and decoding carries on with the next one.

use thiserror::Error;

/// Reason a single record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid JSON in data field: {0}")]
    InvalidJson(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("payload does not match `{event_type}` record: {message}")]
    PayloadMismatch { event_type: String, message: String },
}

impl ProtocolError {
    /// Create a payload mismatch error.
    pub fn payload_mismatch(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PayloadMismatch {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}
