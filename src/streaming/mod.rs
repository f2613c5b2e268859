//! Streaming Module
//!
//! Turns a vendor's line-oriented event feed into the canonical `StreamPart` sequence:
//! - `frame_reader`: text lines -> raw frame payloads (keep-alives and sentinel handled)
//! - `signals`: the vendor-neutral vocabulary decoders translate payloads into
//! - `tool_calls`: correlation of fragmented tool-call arguments
//! - `normalizer`: the per-call state machine producing canonical parts
//! - `pipeline`: lazy, pull-driven glue between the above

mod frame_reader;
mod normalizer;
mod pipeline;
mod signals;
mod tool_calls;
mod types;

pub use frame_reader::*;
pub use normalizer::*;
pub use pipeline::*;
pub use signals::*;
pub use tool_calls::*;
pub use types::*;
