//! OpenAI chat-completions SSE fixtures through the canonical pipeline.

#[path = "support/stream_fixture.rs"]
mod support;

use serde_json::json;
use siumai_relay::LlmError;
use siumai_relay::standards::ProviderFamily;
use siumai_relay::streaming::NormalizerConfig;
use siumai_relay::types::{FinishReason, StreamPart, Usage};

#[tokio::test]
async fn text_stream_with_trailing_usage_chunk() {
    let parts = support::collect_parts(
        "tests/fixtures/openai/text_and_usage.sse",
        ProviderFamily::OpenAiChat,
    )
    .await;
    support::assert_well_formed(&parts);

    assert_eq!(
        support::kinds(&parts),
        vec!["text-start", "text-delta", "text-delta", "text-end", "finish"]
    );
    assert_eq!(support::text_of(&parts), "Hello world");

    let Some(StreamPart::Finish {
        finish_reason,
        model,
        usage,
        ..
    }) = parts.last()
    else {
        panic!("expected finish, got {:?}", parts.last());
    };
    assert_eq!(*finish_reason, FinishReason::Stop);
    assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
    assert_eq!(
        *usage,
        Usage {
            input_tokens: 8,
            output_tokens: 2,
            total_tokens: 10,
            reasoning_tokens: None,
        }
    );
}

#[tokio::test]
async fn interleaved_parallel_tool_calls_finish_in_index_order() {
    let parts = support::collect_parts(
        "tests/fixtures/openai/parallel_tool_calls.sse",
        ProviderFamily::OpenAiChat,
    )
    .await;
    support::assert_well_formed(&parts);

    let starts: Vec<_> = parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::ToolCallStart { call_id, name, .. } => {
                Some((call_id.as_str(), name.as_str()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        starts,
        vec![("call_weather", "get_weather"), ("call_time", "get_time")]
    );

    let weather_args: String = parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::ToolCallArgsDelta { call_id, delta } if call_id == "call_weather" => {
                Some(delta.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(weather_args, r#"{"city":"Paris"}"#);

    let ready: Vec<_> = parts
        .iter()
        .filter_map(|p| match p {
            StreamPart::ToolCallReady { call_id, input, .. } => {
                Some((call_id.as_str(), input.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        ready,
        vec![
            ("call_weather", json!({"city": "Paris"})),
            ("call_time", json!({"tz": "UTC"})),
        ]
    );

    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::ToolCalls,
            ..
        })
    ));
}

#[tokio::test]
async fn reasoning_closes_before_answer_text() {
    let parts = support::collect_parts(
        "tests/fixtures/openai/reasoning_then_content.sse",
        ProviderFamily::OpenAiChat,
    )
    .await;
    support::assert_well_formed(&parts);

    assert_eq!(
        support::kinds(&parts),
        vec![
            "reasoning-start",
            "reasoning-delta",
            "reasoning-delta",
            "reasoning-end",
            "text-start",
            "text-delta",
            "text-end",
            "finish",
        ]
    );
    assert_eq!(support::reasoning_of(&parts), "Let me think.");
    assert_eq!(support::text_of(&parts), "Answer: 42");

    let Some(StreamPart::Finish { usage, .. }) = parts.last() else {
        panic!("expected finish");
    };
    assert_eq!(usage.total_tokens, 30);
    assert_eq!(usage.reasoning_tokens, Some(12));
}

#[tokio::test]
async fn late_call_id_keeps_the_announced_id_and_flushes_at_eof() {
    let parts = support::collect_parts(
        "tests/fixtures/openai/late_id_no_sentinel.sse",
        ProviderFamily::OpenAiChat,
    )
    .await;
    support::assert_well_formed(&parts);

    let ids: Vec<_> = parts.iter().filter_map(StreamPart::call_id).collect();
    assert!(!ids.is_empty());
    assert!(
        ids.iter().all(|id| *id == ids[0]),
        "call id must stay stable across the lifecycle: {ids:?}"
    );

    let ready = parts
        .iter()
        .find_map(|p| match p {
            StreamPart::ToolCallReady {
                name,
                input,
                provider_call_id,
                ..
            } => Some((name.as_str(), input.clone(), provider_call_id.as_deref())),
            _ => None,
        })
        .expect("tool call flushed at end of stream");
    assert_eq!(ready, ("lookup", json!({"q": "rust"}), Some("call_late")));

    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::ToolCalls,
            model: Some(model),
            ..
        }) if model == "compat-model"
    ));
}

#[tokio::test]
async fn malformed_frame_is_skipped_and_stream_continues() {
    let parts = support::collect_parts(
        "tests/fixtures/openai/malformed_frame.sse",
        ProviderFamily::OpenAiChat,
    )
    .await;
    support::assert_well_formed(&parts);
    assert_eq!(support::text_of(&parts), "ok!");
    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            finish_reason: FinishReason::Stop,
            ..
        })
    ));
}

#[tokio::test]
async fn arbitrary_chunk_boundaries_do_not_change_the_feed() {
    let path = "tests/fixtures/openai/parallel_tool_calls.sse";
    let whole = support::collect_parts(path, ProviderFamily::OpenAiChat).await;

    for piece in [1, 7, 64] {
        let items = support::collect_items(
            support::load_sse_fixture_in_pieces(path, piece),
            ProviderFamily::OpenAiChat,
            NormalizerConfig::default(),
        )
        .await;
        let parts: Vec<StreamPart> = items
            .into_iter()
            .collect::<Result<_, LlmError>>()
            .expect("no stream errors");
        assert_eq!(parts, whole, "piece size {piece}");
    }
}

#[tokio::test]
async fn request_settings_are_echoed_on_finish() {
    let items = support::collect_items(
        support::load_sse_fixture_as_bytes("tests/fixtures/openai/late_id_no_sentinel.sse"),
        ProviderFamily::OpenAiChat,
        NormalizerConfig::new()
            .with_argument_deltas(false)
            .with_temperature(0.2),
    )
    .await;
    let parts: Vec<StreamPart> = items.into_iter().map(|r| r.expect("ok")).collect();

    assert!(
        !parts
            .iter()
            .any(|p| matches!(p, StreamPart::ToolCallArgsDelta { .. }))
    );
    assert!(matches!(
        parts.last(),
        Some(StreamPart::Finish {
            temperature: Some(t),
            ..
        }) if (*t - 0.2).abs() < f64::EPSILON
    ));
}
