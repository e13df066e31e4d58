//! Typewriter rendering.
//!
//! Text arrives in bursts; the [`RenderScheduler`] releases it one
//! character at a time at a steady cadence.

mod scheduler;


pub use scheduler::{DEFAULT_RENDER_INTERVAL, RenderScheduler};
