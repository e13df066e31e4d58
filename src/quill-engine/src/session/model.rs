//! The session aggregate observed by the UI.

use std::time::{Duration, SystemTime};

use quill_protocol::{ConversationType, ConversionSummary};
use serde::Serialize;

use super::state::SessionState;

/// Snapshot of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionSession {
    pub state: SessionState,
    /// Never decreases; 0-100.
    pub progress_percent: f64,
    pub stage: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<ConversationType>,
    /// Text currently shown to the user.
    pub displayed_content: String,
    /// Authoritative result, set on successful completion.
    pub final_content: String,
    /// Concatenation of every chunk received so far.
    pub received_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub quality_metrics: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ConversionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<SystemTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<SystemTime>,
    /// Completed, but the typewriter has not caught up with `final_content` yet.
    pub reconcile_pending: bool,
}

impl ConversionSession {
    /// Returns `true` once the state is terminal and nothing is left to display.
    pub fn is_settled(&self) -> bool {
        self.state.is_terminal() && !self.reconcile_pending
    }

    /// Quality score as points out of 100.
    pub fn quality_points(&self) -> Option<u32> {
        self.quality_score
            .filter(|s| s.is_finite())
            .map(|s| (s.clamp(0.0, 1.0) * 100.0).round() as u32)
    }

    /// Wall-clock time from start to the terminal transition.
    pub fn elapsed(&self) -> Option<Duration> {
        let started = self.started_at?;
        let finished = self.finished_at?;
        finished.duration_since(started).ok()
    }
}
