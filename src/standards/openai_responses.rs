//! OpenAI Responses API streaming payloads.
//!
//! Every payload carries a `type`. Function-call argument deltas identify their call
//! only by `output_index`, so they rely on the index alias recorded when the
//! `response.output_item.added` event introduced the call id.

use std::collections::HashSet;

use serde_json::{Value, json};

use super::{PayloadDecoder, error_message, non_empty, openai_usage, str_at, u64_at};
use crate::streaming::{StreamSignal, ToolFragment};
use crate::types::FinishReason;

const WEB_SEARCH_TOOL: &str = "web_search";

pub fn map_incomplete_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("max_output_tokens") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        Some(other) => FinishReason::Other(other.to_string()),
        None => FinishReason::Unknown,
    }
}

#[derive(Debug, Default)]
pub struct OpenAiResponsesDecoder {
    /// Output indices whose arguments arrived as deltas.
    streamed_arguments: HashSet<u64>,
    saw_function_call: bool,
}

impl PayloadDecoder for OpenAiResponsesDecoder {
    fn decode(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let event_type = str_at(payload, "type").unwrap_or_default();
        match event_type {
            "response.created" | "response.in_progress" => payload
                .pointer("/response/model")
                .and_then(Value::as_str)
                .and_then(|m| non_empty(Some(m)))
                .map(StreamSignal::Model)
                .into_iter()
                .collect(),
            "response.output_text.delta" => non_empty(str_at(payload, "delta"))
                .map(|delta| StreamSignal::TextDelta {
                    id: non_empty(str_at(payload, "item_id")),
                    delta,
                })
                .into_iter()
                .collect(),
            "response.output_text.done" => vec![StreamSignal::TextDone {
                id: non_empty(str_at(payload, "item_id")),
            }],
            "response.reasoning_summary_text.delta" => non_empty(str_at(payload, "delta"))
                .map(|delta| StreamSignal::ReasoningDelta {
                    id: Some(reasoning_id(payload)),
                    delta,
                })
                .into_iter()
                .collect(),
            "response.reasoning_summary_text.done" => vec![StreamSignal::ReasoningDone {
                id: Some(reasoning_id(payload)),
            }],
            "response.output_item.added" => self.decode_item_added(payload),
            "response.function_call_arguments.delta" => {
                let Some(index) = u64_at(payload, "/output_index") else {
                    return Vec::new();
                };
                self.streamed_arguments.insert(index);
                non_empty(str_at(payload, "delta"))
                    .map(|arguments| {
                        StreamSignal::ToolFragment(ToolFragment {
                            index: Some(index),
                            arguments: Some(arguments),
                            ..Default::default()
                        })
                    })
                    .into_iter()
                    .collect()
            }
            "response.function_call_arguments.done" => {
                let index = u64_at(payload, "/output_index");
                self.arguments_done(None, index, str_at(payload, "arguments"))
            }
            "response.output_item.done" => self.decode_item_done(payload),
            "response.completed" => self.decode_completed(payload, None),
            "response.incomplete" => {
                let reason = payload
                    .pointer("/response/incomplete_details/reason")
                    .and_then(Value::as_str);
                self.decode_completed(payload, Some(map_incomplete_reason(reason)))
            }
            "response.failed" => vec![StreamSignal::Error {
                message: payload
                    .pointer("/response/error")
                    .filter(|e| !e.is_null())
                    .map(error_message)
                    .unwrap_or_else(|| "response failed".to_string()),
            }],
            "error" => vec![StreamSignal::Error {
                message: error_message(payload),
            }],
            _ => Vec::new(),
        }
    }
}

fn reasoning_id(payload: &Value) -> String {
    let item_id = str_at(payload, "item_id").unwrap_or("reasoning");
    match u64_at(payload, "/summary_index") {
        Some(summary) => format!("{item_id}:{summary}"),
        None => item_id.to_string(),
    }
}

impl OpenAiResponsesDecoder {
    fn decode_item_added(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let index = u64_at(payload, "/output_index");
        let Some(item) = payload.get("item") else {
            return Vec::new();
        };

        match str_at(item, "type").unwrap_or_default() {
            "function_call" => {
                self.saw_function_call = true;
                vec![StreamSignal::ToolFragment(ToolFragment {
                    id: call_id(item),
                    index,
                    name: non_empty(str_at(item, "name")),
                    arguments: non_empty(str_at(item, "arguments")),
                    ..Default::default()
                })]
            }
            "web_search_call" => vec![StreamSignal::ToolFragment(ToolFragment {
                id: non_empty(str_at(item, "id")),
                index,
                name: Some(WEB_SEARCH_TOOL.to_string()),
                provider_executed: true,
                ..Default::default()
            })],
            _ => Vec::new(),
        }
    }

    fn decode_item_done(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let index = u64_at(payload, "/output_index");
        let Some(item) = payload.get("item") else {
            return Vec::new();
        };

        match str_at(item, "type").unwrap_or_default() {
            "function_call" => self.arguments_done(call_id(item), index, str_at(item, "arguments")),
            "web_search_call" => {
                let Some(id) = non_empty(str_at(item, "id")) else {
                    return Vec::new();
                };
                let action = item.get("action").cloned().unwrap_or_else(|| json!({}));
                vec![
                    StreamSignal::ToolFragment(ToolFragment {
                        id: Some(id.clone()),
                        index,
                        arguments: Some(action.to_string()),
                        provider_executed: true,
                        ..Default::default()
                    }),
                    StreamSignal::ToolArgumentsDone {
                        id: Some(id.clone()),
                        index,
                    },
                    StreamSignal::ToolOutput {
                        call_id: id,
                        output: json!({
                            "status": item.get("status").cloned().unwrap_or(Value::Null),
                            "action": action,
                        }),
                        provider_executed: true,
                    },
                ]
            }
            "mcp_call" => {
                let Some(id) = non_empty(str_at(item, "id")) else {
                    return Vec::new();
                };
                let name = format!("mcp.{}", str_at(item, "name").unwrap_or_default());
                let title = non_empty(str_at(item, "server_label"));
                let mut fragment = ToolFragment::new()
                    .with_id(id.clone())
                    .with_name(name)
                    .with_arguments(str_at(item, "arguments").unwrap_or("{}"))
                    .provider_executed(true);
                fragment.title = title;
                vec![
                    StreamSignal::ToolFragment(fragment),
                    StreamSignal::ToolArgumentsDone {
                        id: Some(id.clone()),
                        index: None,
                    },
                    StreamSignal::ToolOutput {
                        call_id: id,
                        output: item.get("output").cloned().unwrap_or(Value::Null),
                        provider_executed: true,
                    },
                ]
            }
            "mcp_approval_request" => {
                let Some(approval_id) = non_empty(str_at(item, "id")) else {
                    return Vec::new();
                };
                let call_id = format!("mcp-approval-{approval_id}");
                let mut fragment = ToolFragment::new()
                    .with_id(call_id.clone())
                    .with_name(format!("mcp.{}", str_at(item, "name").unwrap_or_default()))
                    .with_arguments(str_at(item, "arguments").unwrap_or("{}"));
                fragment.title = non_empty(str_at(item, "server_label"));
                vec![
                    StreamSignal::ToolFragment(fragment),
                    StreamSignal::ToolArgumentsDone {
                        id: Some(call_id.clone()),
                        index: None,
                    },
                    StreamSignal::ToolApprovalRequested {
                        call_id,
                        approval_id,
                    },
                ]
            }
            _ => Vec::new(),
        }
    }

    /// Arguments that were never streamed as deltas are taken from the done event.
    fn arguments_done(
        &mut self,
        id: Option<String>,
        index: Option<u64>,
        arguments: Option<&str>,
    ) -> Vec<StreamSignal> {
        let mut signals = Vec::new();
        let streamed = index.is_some_and(|i| self.streamed_arguments.contains(&i));
        if !streamed && let Some(arguments) = non_empty(arguments) {
            if let Some(i) = index {
                self.streamed_arguments.insert(i);
            }
            signals.push(StreamSignal::ToolFragment(ToolFragment {
                id: id.clone(),
                index,
                arguments: Some(arguments),
                ..Default::default()
            }));
        }
        signals.push(StreamSignal::ToolArgumentsDone { id, index });
        signals
    }

    fn decode_completed(
        &mut self,
        payload: &Value,
        reason: Option<FinishReason>,
    ) -> Vec<StreamSignal> {
        let mut signals = Vec::new();
        if let Some(response) = payload.get("response") {
            if let Some(model) = non_empty(str_at(response, "model")) {
                signals.push(StreamSignal::Model(model));
            }
            if let Some(usage) = response.get("usage").filter(|u| u.is_object()) {
                signals.push(StreamSignal::Usage(openai_usage(usage)));
            }
        }
        let reason = reason.unwrap_or(if self.saw_function_call {
            FinishReason::ToolCalls
        } else {
            FinishReason::Stop
        });
        signals.push(StreamSignal::FinishReason(reason));
        signals.push(StreamSignal::Completed);
        signals
    }
}

fn call_id(item: &Value) -> Option<String> {
    non_empty(str_at(item, "call_id")).or_else(|| non_empty(str_at(item, "id")))
}
