//! Conversion session state machine.
//!
//! A [`ConversionSession`] is the single mutable aggregate of one conversion.
//! Only the [`EventDispatcher`] mutates it; everyone else sees snapshots.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Connecting -> Streaming -> Completed
//!              |            |     \-> Failed
//!              \------------+-------> Cancelled
//! ```
//!
//! Terminal states accept no further events. The one exception is a
//! `Completed` session whose typewriter is still draining: the remaining
//! characters keep being displayed, then the text is reconciled with the
//! authoritative final content.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_engine::session::EventDispatcher;
//! use quill_protocol::DomainEvent;
//!
//! let mut dispatcher = EventDispatcher::new(Duration::from_millis(30));
//! dispatcher.begin();
//! dispatcher.dispatch(DomainEvent::Chunk { content: "Hi".into() }, Instant::now());
//! assert_eq!(dispatcher.session().received_content, "Hi");
//! ```

mod dispatcher;
mod model;
mod state;


pub use dispatcher::EventDispatcher;
pub use model::ConversionSession;
pub use state::SessionState;
