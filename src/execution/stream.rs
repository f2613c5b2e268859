//! Opening a canonical event stream over HTTP

use reqwest::{Client, Method};
use serde_json::Value;

use crate::error::LlmError;
use crate::execution::{RequestContext, classify_error_response};
use crate::streaming::{ChatStreamHandle, NormalizerConfig, stream_from_byte_stream};
use crate::utils::cancel::CancelHandle;

/// POST `body` to `path` and return the normalized feed together with its cancel handle.
///
/// A non-2xx answer is classified into `LlmError::ApiError` before any frame is
/// read. `cancel` aborts the handshake as well as every later read.
pub async fn open_event_stream(
    client: &Client,
    ctx: &RequestContext,
    path: &str,
    body: &Value,
    config: NormalizerConfig,
    cancel: CancelHandle,
) -> Result<ChatStreamHandle, LlmError> {
    let request = ctx.build_stream(client, Method::POST, path)?.json(body);
    tracing::debug!(family = %ctx.family(), url = %ctx.url(path), "opening event stream");

    let response = cancel.run(request.send()).await??;
    if !response.status().is_success() {
        return Err(classify_error_response(response).await);
    }

    let stream = stream_from_byte_stream(
        response.bytes_stream(),
        ctx.family(),
        config,
        cancel.clone(),
    );
    Ok(ChatStreamHandle { stream, cancel })
}
