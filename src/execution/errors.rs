//! HTTP error classification

use reqwest::header::HeaderMap;

use crate::error::LlmError;

const REQUEST_ID_HEADERS: [&str; 5] = [
    "x-request-id",
    "request-id",
    "x-openai-request-id",
    "x-goog-request-id",
    "x-trace-id",
];

/// Turn a non-2xx answer into `LlmError::ApiError`.
///
/// The message prefers the vendor's `error.message`; the parsed body (when JSON) is
/// kept as `details`. Request ids are appended to aid debugging.
pub fn classify_http_error(status: u16, body_text: &str, headers: &HeaderMap) -> LlmError {
    let details = serde_json::from_str::<serde_json::Value>(body_text).ok();
    let vendor_message = details.as_ref().and_then(|body| {
        body.pointer("/error/message")
            .or_else(|| body.get("message"))
            .or_else(|| body.pointer("/base_resp/status_msg"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    });
    let message = vendor_message.unwrap_or_else(|| {
        let sample: String = body_text.chars().take(200).collect();
        if sample.trim().is_empty() {
            format!("HTTP {status}")
        } else {
            sample
        }
    });

    let ids: Vec<String> = REQUEST_ID_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| format!("{name}={v}"))
        })
        .collect();
    let message = if ids.is_empty() {
        message
    } else {
        format!("{message} ids=[{}]", ids.join(","))
    };

    LlmError::ApiError {
        code: status,
        message,
        details,
    }
}

/// Read the body of a failed response and classify it.
pub async fn classify_error_response(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    let error = classify_http_error(status, &body, &headers);
    tracing::debug!(status, error = %error, "upstream answered with an error status");
    error
}
