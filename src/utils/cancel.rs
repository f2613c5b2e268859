//! Cancellation utilities
//!
//! Cancellation handles for streams and long-running operations.
//! Every suspension point of the core (reading the next line of a stream, waiting
//! between polls) races against the handle so a cancel interrupts it immediately.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new, untriggered cancel handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Any wrapped streams/futures observing this handle
    /// will stop as soon as possible. Dropping the cancelled stream will close
    /// the underlying HTTP connection so providers stop generating tokens.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Drive `future` to completion unless cancellation fires first.
    ///
    /// Cancellation wins ties, so an already-cancelled handle never polls `future`.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, LlmError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(LlmError::Cancelled),
            out = future => Ok(out),
        }
    }
}
