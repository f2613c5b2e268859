//! Core Streaming Types

use futures::Stream;
use std::pin::Pin;

use crate::error::LlmError;
use crate::types::StreamPart;

/// Canonical event stream returned for one upstream call.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamPart, LlmError>> + Send>>;

/// Raw frame payloads produced by a `FrameReader`.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Chat stream with first-class cancellation handle
///
/// # Example
/// ```rust,ignore
/// let handle = open_event_stream(
///     &client,
///     &ctx,
///     "chat/completions",
///     &body,
///     NormalizerConfig::default(),
///     CancelHandle::new(),
/// )
/// .await?;
///
/// // Use the stream
/// // ...
///
/// // Cancel if needed
/// handle.cancel.cancel();
/// ```
pub struct ChatStreamHandle {
    /// The underlying chat stream
    pub stream: ChatStream,
    /// Handle to cancel the stream
    pub cancel: crate::utils::cancel::CancelHandle,
}
