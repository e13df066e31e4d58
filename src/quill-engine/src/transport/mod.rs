//! Conversion transport.
//!
//! A [`ConversionTransport`] sends the request and hands back the raw
//! response body as a stream of byte chunks. Framing and dispatch happen
//! in [`driver`].

pub mod driver;
pub(crate) mod http;

pub use driver::run_conversion;
pub use http::HttpTransport;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;

use crate::error::{QuillError, Result};

/// Raw response body, chunked however the network delivered it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Body of a conversion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
    pub text: String,
    /// Optional conversion rules understood by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_config: Option<serde_json::Value>,
}

impl ConversionRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rule_config: None,
        }
    }

    /// Attach a rule configuration object.
    pub fn with_rule_config(mut self, rule_config: serde_json::Value) -> Self {
        self.rule_config = Some(rule_config);
        self
    }

    /// Check the text against the limits the server enforces.
    pub fn validate(&self, max_chars: usize) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(QuillError::invalid_input("text cannot be empty"));
        }
        let chars = self.text.chars().count();
        if chars > max_chars {
            return Err(QuillError::invalid_input(format!(
                "text is {chars} characters, the maximum is {max_chars}"
            )));
        }
        Ok(())
    }
}

/// Opens the response body of a conversion.
#[async_trait]
pub trait ConversionTransport: Send + Sync {
    /// Send the request and return the body stream.
    ///
    /// Fails without a stream on connection errors and non-2xx statuses.
    async fn open(&self, request: &ConversionRequest) -> Result<ByteStream>;

    /// Where requests go, for logs.
    fn endpoint(&self) -> &str;
}
