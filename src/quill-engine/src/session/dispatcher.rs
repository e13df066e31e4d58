//! Folds domain events into the session.

use std::time::{Duration, SystemTime};

use quill_protocol::DomainEvent;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::model::ConversionSession;
use super::state::SessionState;
use crate::error::QuillError;
use crate::render::RenderScheduler;

/// Fallback failure message when the server gives none.
const DEFAULT_FAILURE_MESSAGE: &str = "Conversion failed";

/// The only mutator of a [`ConversionSession`].
///
/// Every method completes synchronously, so a caller driving it from a
/// single task never observes a half-applied transition.
#[derive(Debug)]
pub struct EventDispatcher {
    session: ConversionSession,
    scheduler: RenderScheduler,
}

impl EventDispatcher {
    /// Creates a dispatcher with an idle session.
    pub fn new(render_interval: Duration) -> Self {
        Self {
            session: ConversionSession::default(),
            scheduler: RenderScheduler::new(render_interval),
        }
    }

    pub fn session(&self) -> &ConversionSession {
        &self.session
    }

    /// Owned copy of the session for observers.
    pub fn snapshot(&self) -> ConversionSession {
        self.session.clone()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    /// Next instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.deadline()
    }

    /// Returns `true` once the session is terminal and fully displayed.
    pub fn is_settled(&self) -> bool {
        self.session.is_settled()
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Starts a fresh session in `Connecting`.
    pub fn begin(&mut self) {
        let discarded = self.scheduler.stop();
        if discarded > 0 {
            debug!(discarded, "Discarded queued characters from previous session");
        }
        self.session = ConversionSession {
            state: SessionState::Connecting,
            message: "Connecting".to_string(),
            started_at: Some(SystemTime::now()),
            ..Default::default()
        };
        debug!("Session connecting");
    }

    /// Moves a non-terminal session to `Cancelled` and stops the typewriter.
    ///
    /// A `Completed` session that is still draining skips to its final text
    /// instead.
    pub fn cancel(&mut self) {
        match self.session.state {
            SessionState::Completed if self.session.reconcile_pending => {
                let skipped = self.scheduler.stop();
                debug!(skipped, "Skipping typewriter drain");
                self.reconcile();
            }
            SessionState::Connecting | SessionState::Streaming => {
                let discarded = self.scheduler.stop();
                self.session.state = SessionState::Cancelled;
                self.session.message = "Conversion stopped".to_string();
                self.session.finished_at = Some(SystemTime::now());
                info!(
                    discarded,
                    displayed = self.session.displayed_content.chars().count(),
                    "Conversion cancelled"
                );
            }
            _ => {}
        }
    }

    /// Moves a non-terminal session to `Failed`.
    ///
    /// The displayed text is left as it is.
    pub fn fail(&mut self, message: impl Into<String>) {
        if !self.session.state.is_active() {
            return;
        }
        let message = message.into();
        let discarded = self.scheduler.stop();
        error!(error = %message, discarded, "Conversion failed");

        self.session.state = SessionState::Failed;
        self.session.message = message.clone();
        self.session.error_message = Some(message);
        self.session.finished_at = Some(SystemTime::now());
    }

    /// Signals that the response body ended.
    pub fn end_of_stream(&mut self) {
        if self.session.state.is_active() {
            self.fail(QuillError::UnexpectedEof.to_string());
        }
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Applies one event. Returns `true` if the session changed.
    pub fn dispatch(&mut self, event: DomainEvent, now: Instant) -> bool {
        if !self.session.state.is_active() {
            debug!(
                event = event.name(),
                state = %self.session.state,
                "Ignoring event for inactive session"
            );
            return false;
        }

        if let DomainEvent::ProtocolError { raw, reason } = &event {
            warn!(
                reason = %reason,
                raw = %preview(raw),
                "Dropping invalid record"
            );
            return false;
        }

        if self.session.state == SessionState::Connecting
            && !matches!(event, DomainEvent::Start { .. })
        {
            warn!(event = event.name(), "Event received before start record");
            self.session.state = SessionState::Streaming;
        }

        match event {
            DomainEvent::Start {
                message,
                conversation_type,
            } => {
                info!(conversation_type = %conversation_type.as_str(), "Conversion started");
                self.session.state = SessionState::Streaming;
                self.session.message = message;
                self.session.conversation_type = Some(conversation_type);
            }
            DomainEvent::Progress {
                stage,
                percentage,
                message,
            } => {
                debug!(stage = %stage, percentage, "Progress");
                self.raise_progress(percentage);
                self.session.stage = stage;
                self.session.message = message;
            }
            DomainEvent::Chunk { content } => {
                if !content.is_empty() {
                    self.session.received_content.push_str(&content);
                    let queued = self.scheduler.enqueue(&content, now);
                    debug!(queued, pending = self.scheduler.pending(), "Chunk received");
                }
            }
            DomainEvent::Quality { score, metrics } => {
                debug!(score, "Quality assessed");
                self.session.quality_score = Some(score);
                self.session.quality_metrics = metrics;
            }
            DomainEvent::Complete {
                success: true,
                final_content,
                quality_score,
                summary,
                message,
            } => {
                self.complete(final_content, quality_score, summary, message);
            }
            DomainEvent::Complete {
                success: false,
                message,
                ..
            } => {
                let message = message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
                self.fail(QuillError::application(message).to_string());
            }
            DomainEvent::ServerError { message, detail } => {
                let message = match detail {
                    Some(detail) if !message.contains(detail.as_str()) => {
                        format!("{message}: {detail}")
                    }
                    _ => message,
                };
                self.fail(QuillError::application(message).to_string());
            }
            DomainEvent::ProtocolError { .. } => return false,
        }
        true
    }

    /// Advances the typewriter. Returns `true` if the displayed text changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let released = self
            .scheduler
            .fire_due(now, &mut self.session.displayed_content);

        if self.session.reconcile_pending && self.scheduler.is_idle() {
            self.reconcile();
            return true;
        }
        released > 0
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    fn complete(
        &mut self,
        final_content: String,
        quality_score: Option<f64>,
        summary: Option<quill_protocol::ConversionSummary>,
        message: Option<String>,
    ) {
        let final_content = if final_content.is_empty() {
            self.session.received_content.clone()
        } else {
            final_content
        };

        self.session.state = SessionState::Completed;
        self.session.progress_percent = 100.0;
        self.session.final_content = final_content;
        if quality_score.is_some() {
            self.session.quality_score = quality_score;
        }
        if summary.is_some() {
            self.session.summary = summary;
        }
        self.session.message = message.unwrap_or_else(|| "Conversion complete".to_string());
        self.session.finished_at = Some(SystemTime::now());

        info!(
            final_chars = self.session.final_content.chars().count(),
            pending = self.scheduler.pending(),
            "Conversion completed"
        );

        if self.scheduler.is_idle() {
            self.reconcile();
        } else {
            self.session.reconcile_pending = true;
        }
    }

    /// Makes the displayed text equal to the final content.
    fn reconcile(&mut self) {
        self.session.reconcile_pending = false;
        if self.session.displayed_content != self.session.final_content {
            debug!(
                displayed = self.session.displayed_content.chars().count(),
                final_chars = self.session.final_content.chars().count(),
                "Replacing displayed text with final content"
            );
            self.session.displayed_content = self.session.final_content.clone();
        }
    }

    fn raise_progress(&mut self, percentage: f64) {
        if !percentage.is_finite() {
            warn!(percentage, "Ignoring non-finite progress");
            return;
        }
        let clamped = percentage.clamp(0.0, 100.0);
        if clamped > self.session.progress_percent {
            self.session.progress_percent = clamped;
        }
    }
}

/// First characters of a raw record for logging.
fn preview(raw: &str) -> String {
    const MAX: usize = 120;
    if raw.chars().count() <= MAX {
        raw.to_string()
    } else {
        let head: String = raw.chars().take(MAX).collect();
        format!("{head}...")
    }
}
