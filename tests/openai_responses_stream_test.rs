//! OpenAI Responses API SSE fixtures through the canonical pipeline.

#[path = "support/stream_fixture.rs"]
mod support;

use serde_json::json;
use siumai_relay::standards::ProviderFamily;
use siumai_relay::types::{FinishReason, StreamPart};

#[tokio::test]
async fn function_call_arguments_stream_by_output_index() {
    let parts = support::collect_parts(
        "tests/fixtures/responses/function_call.sse",
        ProviderFamily::OpenAiResponses,
    )
    .await;
    support::assert_well_formed(&parts);

    assert_eq!(
        support::kinds(&parts),
        vec![
            "text-start",
            "text-delta",
            "text-end",
            "tool-call-start",
            "tool-call-args-delta",
            "tool-call-args-delta",
            "tool-call-ready",
            "finish",
        ]
    );
    assert!(matches!(&parts[0], StreamPart::TextStart { id } if id == "msg_1"));
    assert!(matches!(
        &parts[6],
        StreamPart::ToolCallReady { call_id, name, input, .. }
            if call_id == "call_abc" && name == "search_docs" && *input == json!({"query": "tokio"})
    ));

    let Some(StreamPart::Finish {
        finish_reason,
        model,
        usage,
        ..
    }) = parts.last()
    else {
        panic!("expected finish");
    };
    assert_eq!(*finish_reason, FinishReason::ToolCalls);
    assert_eq!(model.as_deref(), Some("gpt-4.1-mini"));
    assert_eq!(usage.total_tokens, 58);
    assert_eq!(usage.reasoning_tokens, Some(0));
}

#[tokio::test]
async fn provider_executed_search_and_mcp_approval() {
    let parts = support::collect_parts(
        "tests/fixtures/responses/web_search_and_mcp_approval.sse",
        ProviderFamily::OpenAiResponses,
    )
    .await;
    support::assert_well_formed(&parts);

    let search_ready = parts
        .iter()
        .find_map(|p| match p {
            StreamPart::ToolCallReady {
                call_id,
                name,
                input,
                provider_executed,
                ..
            } if call_id == "ws_1" => Some((name.clone(), input.clone(), *provider_executed)),
            _ => None,
        })
        .expect("web search call ready");
    assert_eq!(
        search_ready,
        (
            "web_search".to_string(),
            json!({"type": "search", "query": "rust async runtimes"}),
            true
        )
    );
    assert!(parts.iter().any(|p| matches!(
        p,
        StreamPart::ToolOutputAvailable { call_id, provider_executed: true, .. } if call_id == "ws_1"
    )));

    let approval_start = parts
        .iter()
        .find_map(|p| match p {
            StreamPart::ToolCallStart {
                call_id,
                name,
                title,
                ..
            } if call_id == "mcp-approval-mcpr_1" => Some((name.clone(), title.clone())),
            _ => None,
        })
        .expect("approval call announced");
    assert_eq!(
        approval_start,
        ("mcp.create_issue".to_string(), Some("github".to_string()))
    );
    assert!(parts.iter().any(|p| matches!(
        p,
        StreamPart::ToolApprovalRequested { call_id, approval_id }
            if call_id == "mcp-approval-mcpr_1" && approval_id == "mcpr_1"
    )));

    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish { usage, .. }) if usage.total_tokens == 15
    ));
}

#[tokio::test]
async fn failed_response_becomes_stream_error() {
    let parts = support::collect_parts(
        "tests/fixtures/responses/failed.sse",
        ProviderFamily::OpenAiResponses,
    )
    .await;
    support::assert_well_formed(&parts);

    assert_eq!(
        support::kinds(&parts),
        vec!["text-start", "text-delta", "text-end", "stream-error"]
    );
    assert!(matches!(
        parts.last(),
        Some(StreamPart::StreamError { message }) if message == "The model crashed"
    ));
}
