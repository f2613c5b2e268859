//! Error Handling Module
//!
//! A single error type (`LlmError`) covers every failure the relay core can
//! surface to a caller:
//! - transport failures while reading a stream or polling a job
//! - streams whose frames never parsed
//! - polling deadlines and cancellation
//!
//! Errors *reported by the provider inside a stream* are not `LlmError`s; they
//! arrive as `StreamPart::StreamError` events so callers can tell "the provider
//! said no" apart from "the connection broke".
//!
//! # Example
//!
//! ```rust,ignore
//! use siumai_relay::error::LlmError;
//!
//! let error = LlmError::api_error(503, "overloaded");
//! assert!(error.is_retryable());
//! assert!(error.is_transport_failure());
//! ```

mod conversions;
pub mod helpers;
pub mod types;

pub use types::*;
