//! Connector error taxonomy
//!
//! Every failure path in the crate maps to exactly one [`ConnectorError`]
//! variant so callers can branch on kind. Retryable variants are retried
//! internally by the transport before being surfaced.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error classification exposed to callers (and serialized into the
/// response envelope handed to the MCP host).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    NotFound,
    Conflict,
    RateLimited,
    ServiceUnavailable,
    UnexpectedStatus,
    Transport,
    Decode,
    Configuration,
}

/// Connector error types
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited by remote: {message}")]
    RateLimited {
        message: String,
        /// Seconds to wait, from the `Retry-After` response header
        retry_after_secs: Option<u64>,
    },

    #[error("service unavailable: {status} - {message}")]
    ServiceUnavailable { status: u16, message: String },

    /// A status outside the mapping table. Client errors land here and are
    /// never retried, since resending the same request cannot change them.
    #[error("unexpected response status: {status} - {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type for connector operations
pub type ConnectorResult<T> = Result<T, ConnectorError>;

impl ConnectorError {
    /// Classification for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConnectorError::Validation(_) => ErrorKind::Validation,
            ConnectorError::Authentication(_) => ErrorKind::Authentication,
            ConnectorError::NotFound(_) => ErrorKind::NotFound,
            ConnectorError::Conflict(_) => ErrorKind::Conflict,
            ConnectorError::RateLimited { .. } => ErrorKind::RateLimited,
            ConnectorError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            ConnectorError::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            ConnectorError::Transport(_) => ErrorKind::Transport,
            ConnectorError::Decode(_) => ErrorKind::Decode,
            ConnectorError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the same request may succeed if attempted again after backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConnectorError::RateLimited { .. }
                | ConnectorError::ServiceUnavailable { .. }
                | ConnectorError::Transport(_)
        )
    }

    /// Map an HTTP status code to a typed error.
    ///
    /// `message` is the error detail already extracted from the response
    /// body; `retry_after_secs` is only meaningful for 429.
    pub fn from_status(status: u16, message: String, retry_after_secs: Option<u64>) -> Self {
        match status {
            // 422 carries remote business validation failures, same bucket as 400
            400 | 422 => ConnectorError::Validation(message),
            401 | 403 => ConnectorError::Authentication(message),
            404 => ConnectorError::NotFound(message),
            409 => ConnectorError::Conflict(message),
            429 => ConnectorError::RateLimited {
                message,
                retry_after_secs,
            },
            s @ 500..=599 => ConnectorError::ServiceUnavailable { status: s, message },
            // Anything else (405, 410, ...) is a client error and must not
            // be retried
            s => ConnectorError::UnexpectedStatus { status: s, message },
        }
    }

    /// Structured form for the response envelope.
    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.is_retryable(),
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ConnectorError::Decode(e.to_string())
        } else if e.is_timeout() {
            ConnectorError::Transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            ConnectorError::Transport(format!("connection error: {}", e))
        } else {
            ConnectorError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        ConnectorError::Decode(e.to_string())
    }
}

/// Error detail carried in the response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}
