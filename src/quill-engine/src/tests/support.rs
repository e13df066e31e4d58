//! Scripted in-memory transport.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::{QuillError, Result};
use crate::session::ConversionSession;
use crate::transport::{ByteStream, ConversionRequest, ConversionTransport, run_conversion};

/// One step of a scripted response body.
#[derive(Debug, Clone)]
pub enum Step {
    /// Yield these bytes as one chunk.
    Bytes(Vec<u8>),
    /// Wait before the next step.
    Delay(Duration),
    /// Yield a transport error.
    Fail(String),
    /// Never yield again.
    Hang,
}

/// Encodes one wire record.
pub fn record(event: &str, payload: Value) -> Vec<u8> {
    format!("event: {event}\ndata: {payload}\n\n").into_bytes()
}

pub fn bytes(step: Vec<u8>) -> Step {
    Step::Bytes(step)
}

/// Plays back a fixed body for every request.
pub struct ScriptedTransport {
    steps: Vec<Step>,
    open_error: Option<(u16, String)>,
    requests: Mutex<Vec<ConversionRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            open_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reject every request with an HTTP status.
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self {
            open_error: Some((status, message.to_string())),
            ..Self::new(Vec::new())
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversionTransport for ScriptedTransport {
    async fn open(&self, request: &ConversionRequest) -> Result<ByteStream> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some((status, message)) = &self.open_error {
            return Err(QuillError::HttpStatus {
                status: *status,
                message: message.clone(),
            });
        }

        let stream = futures::stream::unfold(self.steps.clone().into_iter(), |mut steps| async move {
            loop {
                match steps.next()? {
                    Step::Bytes(b) => return Some((Ok(Bytes::from(b)), steps)),
                    Step::Fail(message) => return Some((Err(QuillError::Stream(message)), steps)),
                    Step::Delay(d) => tokio::time::sleep(d).await,
                    Step::Hang => std::future::pending::<()>().await,
                }
            }
        });
        Ok(Box::pin(stream))
    }

    fn endpoint(&self) -> &str {
        "scripted://test"
    }
}

/// Configuration with a 30 ms typewriter and the default idle timeout.
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
}

/// Handle on a conversion spawned for a test.
pub struct Running {
    pub updates: watch::Receiver<ConversionSession>,
    pub cancel: CancellationToken,
    pub task: tokio::task::JoinHandle<ConversionSession>,
}

/// Spawns [`run_conversion`] over a scripted body.
pub fn spawn(steps: Vec<Step>, config: EngineConfig) -> Running {
    spawn_with(Arc::new(ScriptedTransport::new(steps)), config)
}

pub fn spawn_with(transport: Arc<dyn ConversionTransport>, config: EngineConfig) -> Running {
    let (tx, updates) = watch::channel(ConversionSession::default());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(run_conversion(
        transport,
        ConversionRequest::new("Q: How are you?\nA: Fine."),
        config,
        tx,
        cancel.clone(),
    ));
    Running {
        updates,
        cancel,
        task,
    }
}
