//! Incremental event-stream decoder.
//!
//! The transport hands over byte chunks of arbitrary size, so a record, a
//! line, or even a multi-byte character may be split across two calls to
//! [`FrameDecoder::decode`]. The decoder keeps every incomplete tail
//! internally and only emits a record once its terminating blank line has
//! been seen. Feeding the same byte stream split at any set of boundaries
//! yields the same sequence of frames.
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_protocol::FrameDecoder;
//!
//! let mut decoder = FrameDecoder::new();
//! assert!(decoder.decode(b"event: chunk\ndata: {\"con").is_empty());
//! let frames = decoder.decode(b"tent\":\"AB\"}\n\n");
//! assert_eq!(frames.len(), 1);
//! ```

use tracing::{trace, warn};

use crate::error::ProtocolError;
use crate::record::{DEFAULT_EVENT_TYPE, Frame, MalformedRecord, WireRecord};

/// Reassembles [`Frame`]s from arbitrarily split byte chunks.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    utf8_tail: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    line_buffer: String,
    /// Fields of the record currently being assembled.
    pending: PendingRecord,
    /// Number of frames emitted so far.
    emitted: u64,
}

impl FrameDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk of bytes and returns every record completed by it.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.push_bytes(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.line_buffer[consumed..].find('\n') {
            let end = consumed + offset;
            let line = &self.line_buffer[consumed..end];
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(frame) = self.pending.feed_line(line) {
                frames.push(frame);
            }
            consumed = end + 1;
        }
        self.line_buffer.drain(..consumed);

        self.emitted += frames.len() as u64;
        frames
    }

    /// Signals end of stream.
    ///
    /// Any unterminated trailing record is discarded, never guessed complete.
    /// Returns the number of bytes that were dropped.
    pub fn finish(&mut self) -> usize {
        let discarded = self.buffered_len();
        if discarded > 0 {
            warn!(
                discarded_bytes = discarded,
                emitted = self.emitted,
                "Discarding unterminated record at end of stream"
            );
        }
        self.utf8_tail.clear();
        self.line_buffer.clear();
        self.pending = PendingRecord::default();
        discarded
    }

    /// Number of bytes held back waiting for more input.
    pub fn buffered_len(&self) -> usize {
        self.utf8_tail.len() + self.line_buffer.len() + self.pending.raw_len
    }

    /// Returns `true` if nothing is held back.
    pub fn is_empty(&self) -> bool {
        self.buffered_len() == 0
    }

    /// Number of frames emitted since the decoder was created.
    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    /// Decodes bytes as UTF-8 into the line buffer.
    ///
    /// An incomplete sequence at the end is kept for the next chunk; invalid
    /// sequences become U+FFFD.
    fn push_bytes(&mut self, chunk: &[u8]) {
        let bytes = if self.utf8_tail.is_empty() {
            chunk.to_vec()
        } else {
            let mut joined = std::mem::take(&mut self.utf8_tail);
            joined.extend_from_slice(chunk);
            joined
        };

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.line_buffer.push_str(text);
                    return;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        self.line_buffer.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            self.line_buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        None => {
                            self.utf8_tail = tail.to_vec();
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Fields collected for the record under assembly.
#[derive(Debug, Default)]
struct PendingRecord {
    event: Option<String>,
    data: Option<String>,
    raw_len: usize,
}

impl PendingRecord {
    /// Applies one complete line. Returns a frame when the line terminates a record.
    fn feed_line(&mut self, line: &str) -> Option<Frame> {
        if line.is_empty() {
            return self.take_frame();
        }
        self.raw_len += line.len() + 1;

        // Comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => match self.data.as_mut() {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" | "retry" => {}
            other => trace!(field = %other, "Ignoring unknown event-stream field"),
        }
        None
    }

    fn take_frame(&mut self) -> Option<Frame> {
        let PendingRecord { event, data, .. } = std::mem::take(self);

        // A block without data is a keep-alive
        let data = data?;
        let event_type = event
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());

        let frame = match serde_json::from_str::<serde_json::Value>(&data) {
            Ok(payload) => Frame::Record(WireRecord {
                event_type,
                data,
                payload,
            }),
            Err(e) => Frame::Malformed(MalformedRecord {
                event_type,
                raw: data,
                reason: ProtocolError::InvalidJson(e.to_string()),
            }),
        };
        Some(frame)
    }
}
