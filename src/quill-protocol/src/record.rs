//! Reassembled wire records.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Event type used when a record carries no `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// One complete `event:` / `data:` block with its JSON payload parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Value of the `event:` line.
    pub event_type: String,
    /// Raw `data:` text (multiple data lines joined with `\n`).
    pub data: String,
    /// `data` parsed as JSON.
    pub payload: serde_json::Value,
}

/// A complete record whose data could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub event_type: String,
    pub raw: String,
    pub reason: ProtocolError,
}

/// Output unit of the [`FrameDecoder`](crate::FrameDecoder).
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Record(WireRecord),
    Malformed(MalformedRecord),
}

impl Frame {
    /// Declared event type of the record.
    pub fn event_type(&self) -> &str {
        match self {
            Self::Record(record) => &record.event_type,
            Self::Malformed(malformed) => &malformed.event_type,
        }
    }

    /// Returns `true` if the record's data was valid JSON.
    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }
}
