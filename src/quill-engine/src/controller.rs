//! Conversion command surface.
//!
//! [`Converter`] keeps at most one conversion in flight. Starting a new one
//! first cancels the previous conversion and waits for its task to finish,
//! so two sessions never share the screen.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::session::ConversionSession;
use crate::transport::{ConversionRequest, ConversionTransport, HttpTransport, run_conversion};

/// Handle on the conversion currently running.
struct ActiveConversion {
    cancel: CancellationToken,
    task: JoinHandle<ConversionSession>,
    updates: watch::Receiver<ConversionSession>,
}

/// Starts, observes and cancels conversions.
pub struct Converter {
    transport: Arc<dyn ConversionTransport>,
    config: EngineConfig,
    active: Option<ActiveConversion>,
}

impl Converter {
    pub fn new(transport: Arc<dyn ConversionTransport>, config: EngineConfig) -> Self {
        Self {
            transport,
            config,
            active: None,
        }
    }

    /// Converter talking HTTP to the configured endpoint.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a conversion and return a receiver of session snapshots.
    ///
    /// Invalid input is rejected before anything is sent and before any
    /// running conversion is touched.
    pub async fn start(
        &mut self,
        request: ConversionRequest,
    ) -> Result<watch::Receiver<ConversionSession>> {
        request.validate(self.config.max_input_chars)?;

        if let Some(previous) = self.cancel().await {
            debug!(state = %previous.state, "Replaced previous conversion");
        }

        let (tx, rx) = watch::channel(ConversionSession::default());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_conversion(
            Arc::clone(&self.transport),
            request,
            self.config.clone(),
            tx,
            cancel.clone(),
        ));

        self.active = Some(ActiveConversion {
            cancel,
            task,
            updates: rx.clone(),
        });
        Ok(rx)
    }

    /// Cancel the running conversion and wait for it to stop.
    ///
    /// Returns the final session, or `None` if nothing was running.
    pub async fn cancel(&mut self) -> Option<ConversionSession> {
        let active = self.active.take()?;
        active.cancel.cancel();
        join(active.task).await
    }

    /// Wait for the running conversion to settle on its own.
    pub async fn wait(&mut self) -> Option<ConversionSession> {
        let active = self.active.take()?;
        join(active.task).await
    }

    /// Token that cancels the running conversion when triggered.
    ///
    /// Lets another task (a signal handler, say) cancel while this
    /// converter is busy in [`wait`](Self::wait).
    pub fn cancellation_token(&self) -> Option<CancellationToken> {
        self.active.as_ref().map(|a| a.cancel.clone())
    }

    /// New receiver for the running conversion's snapshots.
    pub fn subscribe(&self) -> Option<watch::Receiver<ConversionSession>> {
        self.active.as_ref().map(|a| a.updates.clone())
    }

    /// Returns `true` while a conversion task is running.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.task.is_finished())
    }
}

impl Drop for Converter {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

async fn join(task: JoinHandle<ConversionSession>) -> Option<ConversionSession> {
    match task.await {
        Ok(session) => Some(session),
        Err(e) => {
            error!(error = %e, "Conversion task failed");
            None
        }
    }
}
