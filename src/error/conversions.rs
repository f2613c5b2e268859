//! Conversions from common error types

use super::LlmError;

impl From<std::io::Error> for LlmError {
    fn from(err: std::io::Error) -> Self {
        LlmError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::ParseError(format!("JSON error: {err}"))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return LlmError::TimeoutError(format!("Request timed out: {err}"));
        }
        if err.is_connect() {
            return LlmError::ConnectionError(format!("Connection error: {err}"));
        }
        if let Some(status) = err.status() {
            return LlmError::ApiError {
                code: status.as_u16(),
                message: err.to_string(),
                details: None,
            };
        }
        LlmError::HttpError(err.to_string())
    }
}
