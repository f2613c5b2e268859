//! Poll options

use std::time::Duration;

use crate::error::LlmError;

/// Fixed-interval polling configuration.
///
/// There is no backoff: callers that want one vary `interval` between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Delay between two poll invocations
    pub interval: Duration,
    /// Give up once this much time has passed since the first poll
    pub timeout: Option<Duration>,
    /// Give up after this many poll invocations
    pub max_attempts: Option<u32>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Some(Duration::from_secs(600)),
            max_attempts: None,
        }
    }
}

impl PollOptions {
    /// Create default poll options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval between polls
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the overall timeout
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Poll until terminal, however long it takes
    pub const fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Set the maximum number of poll invocations
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        if self.max_attempts == Some(0) {
            return Err(LlmError::InvalidParameter(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
