//! Error types for Quill Engine.

use strum_macros::Display;
use thiserror::Error;

/// Result type alias for Quill operations.
pub type Result<T> = std::result::Result<T, QuillError>;

/// Main error type for Quill Engine.
#[derive(Debug, Error)]
pub enum QuillError {
    // Configuration errors
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // Network errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Connection failed to {endpoint}: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("No data received for {0} seconds")]
    IdleTimeout(u64),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Stream ended unexpectedly")]
    UnexpectedEof,

    // Server-reported failure
    #[error("{0}")]
    Application(String),

    // Validation errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // File system errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`QuillError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Network failure or non-2xx status.
    Transport,
    /// The server reported a failed conversion.
    Application,
    /// Rejected before any request was made.
    Input,
    Config,
}

impl QuillError {
    /// Create an invalid configuration error for a specific field.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an application error.
    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    /// Wrap a reqwest error with the endpoint it was talking to.
    pub fn from_reqwest(e: reqwest::Error, endpoint: &str) -> Self {
        if e.is_connect() || e.is_timeout() {
            return Self::ConnectionFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            };
        }
        Self::Network(e)
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig { .. } | Self::TomlParse(_) => ErrorKind::Config,
            Self::Network(_)
            | Self::ConnectionFailed { .. }
            | Self::HttpStatus { .. }
            | Self::IdleTimeout(_)
            | Self::Stream(_)
            | Self::UnexpectedEof
            | Self::Io(_) => ErrorKind::Transport,
            Self::Application(_) => ErrorKind::Application,
            Self::InvalidInput(_) => ErrorKind::Input,
        }
    }

    /// Check if retrying the same request could succeed.
    ///
    /// Nothing in the engine retries automatically; this is for callers.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Network(_)
            | Self::ConnectionFailed { .. }
            | Self::IdleTimeout(_)
            | Self::Stream(_)
            | Self::UnexpectedEof => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let err = QuillError::HttpStatus {
            status: 400,
            message: "Text cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 400: Text cannot be empty");
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_server_errors_are_retriable() {
        let err = QuillError::HttpStatus {
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert!(err.is_retriable());
        assert!(QuillError::UnexpectedEof.is_retriable());
        assert!(!QuillError::invalid_input("empty").is_retriable());
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(QuillError::application("nope").kind(), ErrorKind::Application);
        assert_eq!(QuillError::invalid_input("x").kind(), ErrorKind::Input);
        assert_eq!(
            QuillError::invalid_config("endpoint", "empty").kind(),
            ErrorKind::Config
        );
        assert_eq!(ErrorKind::Transport.to_string(), "transport");
    }

    #[test]
    fn test_application_message_is_verbatim() {
        let err = QuillError::application("model overloaded");
        assert_eq!(err.to_string(), "model overloaded");
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_unexpected_eof_message() {
        assert_eq!(
            QuillError::UnexpectedEof.to_string(),
            "Stream ended unexpectedly"
        );
        assert_eq!(
            QuillError::IdleTimeout(60).to_string(),
            "No data received for 60 seconds"
        );
    }
}
