//! Shared helpers for SSE fixture tests.
//!
//! Fixtures are recorded vendor streams. Loading splits them into one chunk per
//! event (`\n\n`-separated), mimicking how bytes arrive from an HTTP body.

use std::io;

use bytes::Bytes;
use futures::StreamExt;
use siumai_relay::standards::ProviderFamily;
use siumai_relay::streaming::{NormalizerConfig, stream_from_byte_stream};
use siumai_relay::types::StreamPart;
use siumai_relay::utils::cancel::CancelHandle;
use siumai_relay::LlmError;

/// Load an SSE fixture as a sequence of byte chunks, one per event.
pub fn load_sse_fixture_as_bytes(path: &str) -> Vec<Result<Bytes, io::Error>> {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("failed to read fixture {path}: {e}"));
    text.split_inclusive("\n\n")
        .filter(|chunk| !chunk.trim().is_empty())
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect()
}

/// Same as `load_sse_fixture_as_bytes`, but re-chunked into fixed-size pieces so
/// frames are split at arbitrary byte offsets.
#[allow(dead_code)]
pub fn load_sse_fixture_in_pieces(path: &str, piece: usize) -> Vec<Result<Bytes, io::Error>> {
    let text = std::fs::read(path).unwrap_or_else(|e| panic!("failed to read fixture {path}: {e}"));
    text.chunks(piece.max(1))
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect()
}

/// Run chunks through the canonical pipeline and collect every item.
pub async fn collect_items(
    chunks: Vec<Result<Bytes, io::Error>>,
    family: ProviderFamily,
    config: NormalizerConfig,
) -> Vec<Result<StreamPart, LlmError>> {
    let stream = stream_from_byte_stream(
        futures::stream::iter(chunks),
        family,
        config,
        CancelHandle::new(),
    );
    stream.collect().await
}

/// Run a fixture through the canonical pipeline, panicking on any error item.
pub async fn collect_parts(path: &str, family: ProviderFamily) -> Vec<StreamPart> {
    collect_items(
        load_sse_fixture_as_bytes(path),
        family,
        NormalizerConfig::default(),
    )
    .await
    .into_iter()
    .map(|item| item.unwrap_or_else(|e| panic!("unexpected stream error: {e}")))
    .collect()
}

/// Concatenate every `TextDelta`.
#[allow(dead_code)]
pub fn text_of(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::TextDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}

/// Concatenate every `ReasoningDelta`.
#[allow(dead_code)]
pub fn reasoning_of(parts: &[StreamPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::ReasoningDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}

/// Short tag per part, handy for asserting ordering.
#[allow(dead_code)]
pub fn kinds(parts: &[StreamPart]) -> Vec<&'static str> {
    parts
        .iter()
        .map(|p| match p {
            StreamPart::TextStart { .. } => "text-start",
            StreamPart::TextDelta { .. } => "text-delta",
            StreamPart::TextEnd { .. } => "text-end",
            StreamPart::ReasoningStart { .. } => "reasoning-start",
            StreamPart::ReasoningDelta { .. } => "reasoning-delta",
            StreamPart::ReasoningEnd { .. } => "reasoning-end",
            StreamPart::ToolCallStart { .. } => "tool-call-start",
            StreamPart::ToolCallArgsDelta { .. } => "tool-call-args-delta",
            StreamPart::ToolCallReady { .. } => "tool-call-ready",
            StreamPart::ToolApprovalRequested { .. } => "tool-approval-requested",
            StreamPart::ToolOutputAvailable { .. } => "tool-output-available",
            StreamPart::Finish { .. } => "finish",
            StreamPart::StreamError { .. } => "stream-error",
        })
        .collect()
}

/// Assert structural invariants every canonical feed must hold.
///
/// - exactly one terminal part, and it is last
/// - every delta sits inside its own start/end pair
/// - every tool call starts before its args or ready part
#[allow(dead_code)]
pub fn assert_well_formed(parts: &[StreamPart]) {
    let terminal_count = parts.iter().filter(|p| p.is_terminal()).count();
    assert_eq!(terminal_count, 1, "expected exactly one terminal part: {parts:#?}");
    assert!(
        parts.last().is_some_and(StreamPart::is_terminal),
        "terminal part must be last: {parts:#?}"
    );

    let mut open_text: Option<&str> = None;
    let mut open_reasoning: Option<&str> = None;
    let mut started_calls: Vec<&str> = Vec::new();
    let mut ready_calls: Vec<&str> = Vec::new();

    for part in parts {
        match part {
            StreamPart::TextStart { id } => {
                assert!(open_text.is_none(), "text block opened twice");
                open_text = Some(id);
            }
            StreamPart::TextDelta { id, .. } => assert_eq!(open_text, Some(id.as_str())),
            StreamPart::TextEnd { id } => {
                assert_eq!(open_text.take(), Some(id.as_str()));
            }
            StreamPart::ReasoningStart { id } => {
                assert!(open_reasoning.is_none(), "reasoning block opened twice");
                open_reasoning = Some(id);
            }
            StreamPart::ReasoningDelta { id, .. } => {
                assert_eq!(open_reasoning, Some(id.as_str()))
            }
            StreamPart::ReasoningEnd { id } => {
                assert_eq!(open_reasoning.take(), Some(id.as_str()));
            }
            StreamPart::ToolCallStart { call_id, .. } => {
                assert!(!started_calls.contains(&call_id.as_str()), "duplicate start");
                started_calls.push(call_id);
            }
            StreamPart::ToolCallArgsDelta { call_id, .. } => {
                assert!(started_calls.contains(&call_id.as_str()), "args before start");
                assert!(!ready_calls.contains(&call_id.as_str()), "args after ready");
            }
            StreamPart::ToolCallReady { call_id, .. } => {
                assert!(started_calls.contains(&call_id.as_str()), "ready before start");
                assert!(!ready_calls.contains(&call_id.as_str()), "ready twice");
                ready_calls.push(call_id);
            }
            _ => {}
        }
    }

    assert!(open_text.is_none(), "text block left open");
    assert!(open_reasoning.is_none(), "reasoning block left open");
}
