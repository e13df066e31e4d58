//! Typed conversion events.
//!
//! Every record declares its type on the `event:` line. The payload is
//! validated against that declared type; a payload that does not have the
//! expected shape becomes [`DomainEvent::ProtocolError`] instead of being
//! reinterpreted as some other event.

use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::conversation::ConversationType;
use crate::error::ProtocolError;
use crate::record::{Frame, MalformedRecord, WireRecord};

// ============================================================
// Event Types
// ============================================================

/// Event types understood by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Start,
    Progress,
    Chunk,
    Quality,
    Complete,
    /// Failure record emitted by the server's error path.
    Error,
}

impl FromStr for EventType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "progress" => Ok(Self::Progress),
            "chunk" => Ok(Self::Chunk),
            "quality" => Ok(Self::Quality),
            "complete" => Ok(Self::Complete),
            "error" => Ok(Self::Error),
            other => Err(ProtocolError::UnknownEventType(other.to_string())),
        }
    }
}

// ============================================================
// Payloads
// ============================================================

/// Payload of a `start` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPayload {
    pub message: String,
    pub conversation_type: ConversationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_length: Option<u64>,
}

/// Payload of a `progress` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub stage: String,
    pub percentage: f64,
    pub message: String,
}

/// Payload of a `chunk` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u64>,
}

/// Payload of a `quality` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPayload {
    pub score: f64,
    pub metrics: serde_json::Map<String, serde_json::Value>,
}

/// Summary attached to a `complete` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Any other fields the server included.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Payload of a `complete` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
    pub success: bool,
    #[serde(default)]
    pub final_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_summary: Option<ConversionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload of an `error` record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================
// Domain Events
// ============================================================

/// A validated record, ready to be folded into session state.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    Start {
        message: String,
        conversation_type: ConversationType,
    },
    Progress {
        stage: String,
        percentage: f64,
        message: String,
    },
    Chunk {
        content: String,
    },
    Quality {
        score: f64,
        metrics: serde_json::Map<String, serde_json::Value>,
    },
    Complete {
        success: bool,
        final_content: String,
        quality_score: Option<f64>,
        summary: Option<ConversionSummary>,
        /// Failure description when `success` is false.
        message: Option<String>,
    },
    /// Failure reported through an `error` record.
    ServerError {
        message: String,
        detail: Option<String>,
    },
    /// A record that could not be decoded or validated.
    ProtocolError { raw: String, reason: ProtocolError },
}

impl DomainEvent {
    /// Validates a decoded frame.
    pub fn from_frame(frame: Frame) -> Self {
        match frame {
            Frame::Record(record) => Self::from_record(record),
            Frame::Malformed(MalformedRecord { raw, reason, .. }) => {
                Self::ProtocolError { raw, reason }
            }
        }
    }

    /// Validates a record's payload against its declared event type.
    pub fn from_record(record: WireRecord) -> Self {
        let WireRecord {
            event_type,
            data,
            payload,
        } = record;

        let kind = match event_type.parse::<EventType>() {
            Ok(kind) => kind,
            Err(reason) => return Self::ProtocolError { raw: data, reason },
        };

        let parsed = match kind {
            EventType::Start => parse::<StartPayload>(payload).map(Self::from),
            EventType::Progress => parse::<ProgressPayload>(payload).map(Self::from),
            EventType::Chunk => parse::<ChunkPayload>(payload).map(Self::from),
            EventType::Quality => parse::<QualityPayload>(payload).map(Self::from),
            EventType::Complete => parse::<CompletePayload>(payload).map(Self::from),
            EventType::Error => parse::<ErrorPayload>(payload).map(Self::from),
        };

        parsed.unwrap_or_else(|e| Self::ProtocolError {
            raw: data,
            reason: ProtocolError::payload_mismatch(kind.to_string(), e.to_string()),
        })
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start",
            Self::Progress { .. } => "progress",
            Self::Chunk { .. } => "chunk",
            Self::Quality { .. } => "quality",
            Self::Complete { .. } => "complete",
            Self::ServerError { .. } => "error",
            Self::ProtocolError { .. } => "protocol_error",
        }
    }

    /// Returns `true` if the event ends the conversion.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::ServerError { .. })
    }
}

fn parse<T: DeserializeOwned>(payload: serde_json::Value) -> serde_json::Result<T> {
    serde_json::from_value(payload)
}

impl From<StartPayload> for DomainEvent {
    fn from(payload: StartPayload) -> Self {
        Self::Start {
            message: payload.message,
            conversation_type: payload.conversation_type,
        }
    }
}

impl From<ProgressPayload> for DomainEvent {
    fn from(payload: ProgressPayload) -> Self {
        Self::Progress {
            stage: payload.stage,
            percentage: payload.percentage,
            message: payload.message,
        }
    }
}

impl From<ChunkPayload> for DomainEvent {
    fn from(payload: ChunkPayload) -> Self {
        Self::Chunk {
            content: payload.content,
        }
    }
}

impl From<QualityPayload> for DomainEvent {
    fn from(payload: QualityPayload) -> Self {
        Self::Quality {
            score: payload.score,
            metrics: payload.metrics,
        }
    }
}

impl From<CompletePayload> for DomainEvent {
    fn from(payload: CompletePayload) -> Self {
        Self::Complete {
            success: payload.success,
            final_content: payload.final_content,
            quality_score: payload.quality_score,
            summary: payload.conversion_summary,
            message: payload.error.or(payload.message),
        }
    }
}

impl From<ErrorPayload> for DomainEvent {
    fn from(payload: ErrorPayload) -> Self {
        let message = payload
            .message
            .clone()
            .or_else(|| payload.error.clone())
            .unwrap_or_else(|| "Conversion failed".to_string());
        let detail = payload.error.filter(|e| *e != message);
        Self::ServerError { message, detail }
    }
}
