//! Quill Engine - streamed conversion client core
//!
//! This crate drives one conversion from request to final text:
//! - `transport/` - POSTs the request and yields the raw response body
//! - `session/` - the session state machine and event dispatcher
//! - `render/` - the typewriter scheduler that paces displayed text
//! - `controller` - the `start` / `cancel` command surface
//!
//! Observers receive [`ConversionSession`] snapshots through a
//! `tokio::sync::watch` channel.

pub mod config;
pub mod controller;
pub mod error;
pub mod render;
pub mod session;
pub mod transport;

#[cfg(test)]
mod tests;

// Re-exports
pub use config::EngineConfig;
pub use controller::Converter;
pub use error::{ErrorKind, QuillError, Result};
pub use render::RenderScheduler;
pub use session::{ConversionSession, EventDispatcher, SessionState};
pub use transport::{ByteStream, ConversionRequest, ConversionTransport, HttpTransport};

pub use quill_protocol::{ConversationType, DomainEvent};
