//! Canonical data contracts
//!
//! `StreamPart` is the vendor-independent event vocabulary produced by the
//! stream normalizer; `TaskState` is the document a task poller hands back.

mod stream_part;
mod task;

pub use stream_part::*;
pub use task::*;
