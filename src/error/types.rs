//! Core error types

use std::time::Duration;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors produced by the streaming and polling core.
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    /// HTTP request could not be sent or the body could not be read.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Connection could not be established.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Transport-level timeout (not to be confused with `PollingTimedOut`).
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// Upstream answered with a non-success status code.
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// A document (task status, response body) could not be interpreted.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Every frame of a stream failed to parse as the expected structured shape.
    #[error("Malformed frame payload: {0}")]
    MalformedFramePayload(String),

    /// I/O failure while reading the underlying byte stream.
    #[error("IO error: {0}")]
    IoError(String),

    /// A long-running job did not reach a terminal state in time.
    #[error("Polling timed out after {attempts} attempt(s) ({elapsed:?})")]
    PollingTimedOut { attempts: u32, elapsed: Duration },

    /// The caller's cancellation signal fired.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration (bad header name/value, unknown provider family).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
