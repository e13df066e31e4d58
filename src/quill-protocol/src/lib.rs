//! Quill Protocol - wire framing for streamed conversions
//!
//! The conversion service answers a POST with an event-stream body made of
//! `event:` / `data:` blocks separated by blank lines. This crate turns the
//! raw byte chunks of that body into complete records ([`FrameDecoder`]) and
//! validates each record against its declared type ([`DomainEvent`]).

pub mod conversation;
pub mod decoder;
pub mod error;
pub mod events;
pub mod record;

#[cfg(test)]
mod tests;

// Re-exports
pub use conversation::ConversationType;
pub use decoder::FrameDecoder;
pub use error::ProtocolError;
pub use events::{
    ChunkPayload, CompletePayload, ConversionSummary, DomainEvent, ErrorPayload, EventType,
    ProgressPayload, QualityPayload, StartPayload,
};
pub use record::{DEFAULT_EVENT_TYPE, Frame, MalformedRecord, WireRecord};
