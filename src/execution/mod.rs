//! Execution Layer
//!
//! The thin HTTP edge of the crate: an immutable per-call `RequestContext`, error
//! classification for non-2xx answers, and the two consumers of the core
//! (`open_event_stream` for streaming calls, `HttpTaskClient` for task APIs).
//! The shared `reqwest::Client` is borrowed, never configured, from here.

mod context;
mod errors;
mod stream;
mod task_client;

pub use context::{AuthScheme, RequestContext};
pub use errors::{classify_error_response, classify_http_error};
pub use stream::open_event_stream;
pub use task_client::HttpTaskClient;
