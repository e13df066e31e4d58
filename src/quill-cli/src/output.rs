//! Terminal rendering of session snapshots.
//!
//! Text goes to `out` incrementally: each snapshot prints only what was
//! typed since the previous one. Status lines go to `status` so that
//! redirecting stdout captures just the converted text.

use std::io::{self, Write};

use quill_engine::{ConversionSession, SessionState};

/// Identity of a status line, used to avoid printing duplicates.
#[derive(Debug, Clone, PartialEq)]
struct StatusKey {
    state: SessionState,
    stage: String,
    percent: u32,
}

/// Prints snapshots as they arrive.
pub struct Renderer<O: Write, S: Write> {
    out: O,
    status: S,
    /// Text already written to `out`
    printed: String,
    last_status: Option<StatusKey>,
    /// Type the text to `out` (off in JSON mode)
    stream_text: bool,
    /// Print status lines
    show_status: bool,
}

impl Renderer<io::Stdout, io::Stderr> {
    /// Renderer on the process's stdout and stderr.
    pub fn stdio(stream_text: bool, show_status: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), stream_text, show_status)
    }
}

impl<O: Write, S: Write> Renderer<O, S> {
    pub fn new(out: O, status: S, stream_text: bool, show_status: bool) -> Self {
        Self {
            out,
            status,
            printed: String::new(),
            last_status: None,
            stream_text,
            show_status,
        }
    }

    /// Render one snapshot.
    pub fn update(&mut self, session: &ConversionSession) -> io::Result<()> {
        if self.show_status {
            self.write_status(session)?;
        }
        if self.stream_text {
            self.write_text(&session.displayed_content)?;
        }
        Ok(())
    }

    /// Render the final session and the closing summary.
    pub fn finish(&mut self, session: &ConversionSession) -> io::Result<()> {
        self.update(session)?;

        if self.stream_text && !self.printed.is_empty() {
            writeln!(self.out)?;
        }
        self.out.flush()?;

        if self.show_status {
            writeln!(self.status, "{}", summary_line(session))?;
        }
        self.status.flush()
    }

    fn write_text(&mut self, displayed: &str) -> io::Result<()> {
        if displayed == self.printed {
            return Ok(());
        }

        match displayed.strip_prefix(self.printed.as_str()) {
            Some(typed) => write!(self.out, "{typed}")?,
            None => {
                // The final text replaced what was typed; print it whole.
                if !self.printed.is_empty() {
                    writeln!(self.out)?;
                    if self.show_status {
                        writeln!(self.status, "-- revised final text --")?;
                    }
                }
                write!(self.out, "{displayed}")?;
            }
        }
        self.printed = displayed.to_string();
        self.out.flush()
    }

    fn write_status(&mut self, session: &ConversionSession) -> io::Result<()> {
        // Terminal states are reported by the summary line.
        if session.state.is_terminal() || session.state == SessionState::Idle {
            return Ok(());
        }

        let key = StatusKey {
            state: session.state,
            stage: session.stage.clone(),
            percent: session.progress_percent.round() as u32,
        };
        if self.last_status.as_ref() == Some(&key) {
            return Ok(());
        }

        let mut line = format!("[{:>3}%] {}", key.percent, session.state.label());
        if let Some(kind) = &session.conversation_type {
            line.push_str(&format!(" · {kind}"));
        }
        if !session.message.is_empty() {
            line.push_str(&format!(" · {}", session.message));
        }

        writeln!(self.status, "{line}")?;
        self.last_status = Some(key);
        Ok(())
    }

    /// Text written to `out` so far.
    pub fn printed(&self) -> &str {
        &self.printed
    }

    pub fn into_inner(self) -> (O, S) {
        (self.out, self.status)
    }
}

/// One-line outcome description.
pub fn summary_line(session: &ConversionSession) -> String {
    match session.state {
        SessionState::Completed => {
            let mut line = String::from("Completed");
            if let Some(elapsed) = session.elapsed() {
                line.push_str(&format!(" in {:.1}s", elapsed.as_secs_f64()));
            }
            if let Some(points) = session.quality_points() {
                line.push_str(&format!(" · quality {points}/100"));
            }
            if let Some(summary) = &session.summary
                && let (Some(original), Some(final_len)) =
                    (summary.original_length, summary.final_length)
            {
                line.push_str(&format!(" · {original} → {final_len} chars"));
            }
            line
        }
        SessionState::Failed => format!(
            "Conversion failed: {}",
            session
                .error_message
                .as_deref()
                .unwrap_or("unknown error")
        ),
        SessionState::Cancelled => "Stopped".to_string(),
        other => other.label().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quill_engine::ConversationType;

    use super::*;

    fn session(state: SessionState, displayed: &str) -> ConversionSession {
        ConversionSession {
            state,
            displayed_content: displayed.to_string(),
            ..Default::default()
        }
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_incremental_text() {
        let mut renderer = Renderer::new(Vec::new(), Vec::new(), true, false);
        renderer.update(&session(SessionState::Streaming, "He")).unwrap();
        renderer.update(&session(SessionState::Streaming, "Hello")).unwrap();
        renderer.update(&session(SessionState::Streaming, "Hello")).unwrap();
        renderer
            .finish(&session(SessionState::Completed, "Hello"))
            .unwrap();

        let (out, status) = renderer.into_inner();
        assert_eq!(text(out), "Hello\n");
        assert!(status.is_empty());
    }

    #[test]
    fn test_reconciled_text_is_reprinted() {
        let mut renderer = Renderer::new(Vec::new(), Vec::new(), true, true);
        renderer.update(&session(SessionState::Streaming, "helo")).unwrap();
        renderer
            .finish(&session(SessionState::Completed, "hello"))
            .unwrap();

        let (out, status) = renderer.into_inner();
        assert_eq!(text(out), "helo\nhello\n");
        assert!(text(status).contains("revised final text"));
    }

    #[test]
    fn test_status_lines_are_deduplicated() {
        let mut renderer = Renderer::new(Vec::new(), Vec::new(), false, true);
        let mut s = session(SessionState::Streaming, "");
        s.conversation_type = Some(ConversationType::Meeting);
        s.stage = "converting".to_string();
        s.message = "Converting".to_string();
        s.progress_percent = 40.0;

        renderer.update(&s).unwrap();
        renderer.update(&s).unwrap();
        s.progress_percent = 48.0;
        renderer.update(&s).unwrap();

        let (out, status) = renderer.into_inner();
        assert!(out.is_empty());
        assert_eq!(
            text(status),
            "[ 40%] Converting · Meeting notes · Converting\n[ 48%] Converting · Meeting notes · Converting\n"
        );
    }

    #[test]
    fn test_summary_lines() {
        let mut failed = session(SessionState::Failed, "");
        failed.error_message = Some("HTTP 400: Text too long".to_string());
        assert_eq!(
            summary_line(&failed),
            "Conversion failed: HTTP 400: Text too long"
        );

        assert_eq!(summary_line(&session(SessionState::Cancelled, "")), "Stopped");

        let mut done = session(SessionState::Completed, "x");
        done.quality_score = Some(0.914);
        assert_eq!(summary_line(&done), "Completed · quality 91/100");
    }
}
