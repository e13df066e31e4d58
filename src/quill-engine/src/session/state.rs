//! Session lifecycle states.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Lifecycle state of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    /// No conversion started yet.
    #[default]
    Idle,

    /// Request sent, waiting for the first record.
    Connecting,

    /// Records are arriving.
    Streaming,

    /// The server reported success.
    ///
    /// The typewriter may still be draining; see
    /// [`ConversionSession::reconcile_pending`](super::ConversionSession::reconcile_pending).
    Completed,

    /// Transport failure, timeout, or a failure reported by the server.
    Failed,

    /// Stopped by the user.
    Cancelled,
}

impl SessionState {
    /// Returns `true` once no further transitions are possible.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` while a conversion is in flight.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    /// Short status label for displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Connecting => "Connecting",
            Self::Streaming => "Converting",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Stopped",
        }
    }
}
