//! HTTP implementation of [`ConversionTransport`].

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, error, info};

use super::{ByteStream, ConversionRequest, ConversionTransport};
use crate::config::EngineConfig;
use crate::error::{QuillError, Result};

/// Longest body excerpt included in an error message.
const BODY_PREVIEW_CHARS: usize = 200;

/// Streams conversions from the HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Build a transport from the engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self::with_client(client, config.endpoint.clone()))
    }

    /// Use a preconfigured client.
    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ConversionTransport for HttpTransport {
    async fn open(&self, request: &ConversionRequest) -> Result<ByteStream> {
        info!(
            url = %self.endpoint,
            text_chars = request.text.chars().count(),
            has_rule_config = request.rule_config.is_some(),
            "Starting conversion request"
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %self.endpoint, "Failed to send request");
                QuillError::from_reqwest(e, &self.endpoint)
            })?;

        let status = resp.status();
        debug!(status = %status, "Response received");

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!(status = %status, url = %self.endpoint, body = %body, "Conversion request rejected");
            return Err(QuillError::HttpStatus {
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        let stream = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| QuillError::Stream(e.to_string())));
        Ok(Box::pin(stream))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Message for a non-2xx response.
///
/// Prefers the server's JSON `detail`, then `error.message`, then `error`;
/// falls back to the status reason with a body excerpt.
pub(crate) fn status_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let from_json = match json.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(detail) if !detail.is_null() => Some(detail.to_string()),
            _ => json
                .pointer("/error/message")
                .or_else(|| json.get("error"))
                .and_then(|v| v.as_str())
                .map(String::from),
        };
        if let Some(message) = from_json {
            return message;
        }
    }

    let reason = status.canonical_reason().unwrap_or("Unknown status");
    let body = body.trim();
    if body.is_empty() {
        return reason.to_string();
    }

    let mut preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
    if body.chars().count() > BODY_PREVIEW_CHARS {
        preview.push_str("...");
    }
    format!("{reason} - {preview}")
}
