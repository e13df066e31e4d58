//! Drives one conversion from request to settled session.
//!
//! A single task owns the decoder, the dispatcher and the response stream,
//! and waits on four sources at once:
//!
//! 1. cancellation
//! 2. the typewriter deadline
//! 3. the next body chunk (until the session is terminal)
//! 4. the idle deadline (while reading)
//!
//! Each wake-up applies its mutation synchronously, then publishes a
//! snapshot. The loop ends once the session is terminal and nothing is left
//! to display.

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use quill_protocol::{DomainEvent, FrameDecoder};
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ByteStream, ConversionRequest, ConversionTransport};
use crate::config::EngineConfig;
use crate::error::{QuillError, Result};
use crate::session::{ConversionSession, EventDispatcher};

/// Run a conversion to completion and return the final session.
///
/// Snapshots are sent to `updates` after every change. Cancelling `cancel`
/// drops the response stream and stops the typewriter.
pub async fn run_conversion(
    transport: Arc<dyn ConversionTransport>,
    request: ConversionRequest,
    config: EngineConfig,
    updates: watch::Sender<ConversionSession>,
    cancel: CancellationToken,
) -> ConversionSession {
    let idle_timeout = config.idle_timeout();
    let mut dispatcher = EventDispatcher::new(config.render_interval());
    dispatcher.begin();
    publish(&updates, &dispatcher);

    let mut last_activity = Instant::now();
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        _ = sleep_opt(idle_deadline(last_activity, idle_timeout)) => {
            Some(Err(QuillError::IdleTimeout(secs(idle_timeout))))
        }
        result = transport.open(&request) => Some(result),
    };

    let mut stream: Option<ByteStream> = match opened {
        None => {
            dispatcher.cancel();
            None
        }
        Some(Err(e)) => {
            warn!(error = %e, kind = %e.kind(), endpoint = %transport.endpoint(), "Could not open conversion stream");
            dispatcher.fail(e.to_string());
            None
        }
        Some(Ok(stream)) => {
            debug!("Conversion stream open");
            last_activity = Instant::now();
            Some(stream)
        }
    };
    publish(&updates, &dispatcher);

    let mut decoder = FrameDecoder::new();

    while !dispatcher.is_settled() {
        let render_deadline = dispatcher.next_deadline();
        let idle_at = idle_deadline(last_activity, idle_timeout);

        let changed = tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                dispatcher.cancel();
                true
            }

            _ = sleep_opt(render_deadline), if render_deadline.is_some() => {
                dispatcher.tick(Instant::now())
            }

            chunk = next_chunk(&mut stream), if stream.is_some() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        last_activity = Instant::now();
                        feed(&mut decoder, &mut dispatcher, &bytes, last_activity)
                    }
                    Some(Err(e)) => {
                        dispatcher.fail(e.to_string());
                        true
                    }
                    None => {
                        let discarded = decoder.finish();
                        debug!(discarded, frames = decoder.frames_emitted(), "Conversion stream ended");
                        dispatcher.end_of_stream();
                        stream = None;
                        true
                    }
                }
            }

            _ = sleep_opt(idle_at), if stream.is_some() && idle_at.is_some() => {
                dispatcher.fail(QuillError::IdleTimeout(secs(idle_timeout)).to_string());
                true
            }
        };

        if dispatcher.session().state.is_terminal() && stream.take().is_some() {
            debug!("Dropped response stream");
        }
        if changed {
            publish(&updates, &dispatcher);
        }
    }

    let session = dispatcher.snapshot();
    info!(
        state = %session.state,
        displayed_chars = session.displayed_content.chars().count(),
        "Conversion settled"
    );
    session
}

/// Decode a chunk and dispatch every frame it completes.
fn feed(
    decoder: &mut FrameDecoder,
    dispatcher: &mut EventDispatcher,
    bytes: &Bytes,
    now: Instant,
) -> bool {
    let mut changed = false;
    for frame in decoder.decode(bytes) {
        changed |= dispatcher.dispatch(DomainEvent::from_frame(frame), now);
    }
    // A chunk enqueued while idle is due immediately.
    changed |= dispatcher.tick(now);
    changed
}

fn publish(updates: &watch::Sender<ConversionSession>, dispatcher: &EventDispatcher) {
    updates.send_replace(dispatcher.snapshot());
}

async fn next_chunk(stream: &mut Option<ByteStream>) -> Option<Result<Bytes>> {
    match stream {
        Some(stream) => stream.next().await,
        None => pending().await,
    }
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}

/// `None` when there is no timeout or the deadline is past what `Instant` can hold.
fn idle_deadline(last_activity: Instant, timeout: Option<Duration>) -> Option<Instant> {
    timeout.and_then(|t| last_activity.checked_add(t))
}

fn secs(timeout: Option<Duration>) -> u64 {
    timeout.map(|t| t.as_secs()).unwrap_or_default()
}
