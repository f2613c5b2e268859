//! Error classification helpers

use super::LlmError;

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        LlmError::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status code, when the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the failure came from the transport (read/poll call) rather than
    /// from interpreting data or from the caller.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_)
                | LlmError::ConnectionError(_)
                | LlmError::TimeoutError(_)
                | LlmError::IoError(_)
                | LlmError::ApiError { .. }
        )
    }

    /// Whether a caller-side HTTP retry policy may reasonably retry this error.
    ///
    /// The core never retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { code, .. } => matches!(code, 408 | 409 | 429 | 500..=599),
            LlmError::ConnectionError(_) | LlmError::TimeoutError(_) => true,
            LlmError::HttpError(_) | LlmError::IoError(_) => true,
            _ => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LlmError::Cancelled)
    }

    pub fn is_polling_timeout(&self) -> bool {
        matches!(self, LlmError::PollingTimedOut { .. })
    }
}
