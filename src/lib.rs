//! siumai-relay
//!
//! Streaming normalization and long-running task polling for multi-provider LLM gateways.
//!
//! - `streaming`: vendor SSE feeds in, one canonical `StreamPart` sequence out
//! - `standards`: per-vendor payload decoders and task-document mappers
//! - `polling`: the shared poll-until-terminal combinator and `TaskClient` seam
//! - `execution`: per-call request context and the HTTP consumers of the above
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use siumai_relay::prelude::*;
//!
//! let ctx = RequestContext::new(ProviderFamily::OpenAiChat, "https://api.openai.com/v1")
//!     .with_credential(api_key);
//! let mut handle = open_event_stream(
//!     &reqwest::Client::new(),
//!     &ctx,
//!     "chat/completions",
//!     &body,
//!     NormalizerConfig::default(),
//!     CancelHandle::new(),
//! )
//! .await?;
//! while let Some(part) = handle.stream.next().await {
//!     println!("{}", part?.to_sse_frame()?);
//! }
//! ```
#![deny(unsafe_code)]

pub mod error;
pub mod execution;
pub mod observability;
pub mod polling;
pub mod standards;
pub mod streaming;
pub mod types;
pub mod utils;

pub use error::LlmError;

/// Commonly used types
pub mod prelude {
    pub use crate::error::{LlmError, Result};
    pub use crate::execution::{HttpTaskClient, RequestContext, open_event_stream};
    pub use crate::polling::{
        PollOptions, TaskClient, poll_until_terminal, run_task, run_task_or_timeout,
    };
    pub use crate::standards::{PayloadDecoder, ProviderFamily, TaskFamily};
    pub use crate::streaming::{
        ArgumentPolicy, ChatStream, ChatStreamHandle, FrameProtocol, FrameReader,
        NormalizerConfig, StreamNormalizer, StreamSignal, normalize_frames, stream_from_reader,
    };
    pub use crate::types::{FinishReason, StreamPart, TaskState, TaskStatus, Usage};
    pub use crate::utils::cancel::CancelHandle;
}
