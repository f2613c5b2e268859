//! Anthropic messages streaming payloads.
//!
//! Content arrives in indexed blocks (`content_block_start/delta/stop`). The block
//! index doubles as the text/reasoning stream id and as the tool-call position.

use std::collections::HashMap;

use serde_json::Value;

use super::{PayloadDecoder, error_message, non_empty, str_at, u64_at};
use crate::streaming::{StreamSignal, ToolFragment, UsageUpdate};
use crate::types::FinishReason;

pub fn map_stop_reason(reason: &str) -> FinishReason {
    match reason {
        "end_turn" | "stop_sequence" => FinishReason::Stop,
        "max_tokens" => FinishReason::Length,
        "tool_use" => FinishReason::ToolCalls,
        "refusal" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Block {
    Text,
    Thinking,
    ToolUse { id: String },
    Other,
}

#[derive(Debug, Default)]
pub struct AnthropicDecoder {
    blocks: HashMap<u64, Block>,
}

impl PayloadDecoder for AnthropicDecoder {
    fn decode(&mut self, payload: &Value) -> Vec<StreamSignal> {
        match str_at(payload, "type").unwrap_or_default() {
            "message_start" => decode_message_start(payload),
            "content_block_start" => self.decode_block_start(payload),
            "content_block_delta" => self.decode_block_delta(payload),
            "content_block_stop" => self.decode_block_stop(payload),
            "message_delta" => decode_message_delta(payload),
            "message_stop" => vec![StreamSignal::Completed],
            "error" => vec![StreamSignal::Error {
                message: payload
                    .get("error")
                    .map(error_message)
                    .unwrap_or_else(|| "unknown error".to_string()),
            }],
            // ping and future event types
            _ => Vec::new(),
        }
    }
}

fn decode_message_start(payload: &Value) -> Vec<StreamSignal> {
    let Some(message) = payload.get("message") else {
        return Vec::new();
    };
    let mut signals = Vec::new();
    if let Some(model) = non_empty(str_at(message, "model")) {
        signals.push(StreamSignal::Model(model));
    }
    if let Some(usage) = message.get("usage") {
        signals.push(StreamSignal::Usage(anthropic_usage(usage)));
    }
    signals
}

fn decode_message_delta(payload: &Value) -> Vec<StreamSignal> {
    let mut signals = Vec::new();
    if let Some(reason) = payload.pointer("/delta/stop_reason").and_then(Value::as_str) {
        signals.push(StreamSignal::FinishReason(map_stop_reason(reason)));
    }
    if let Some(usage) = payload.get("usage") {
        signals.push(StreamSignal::Usage(anthropic_usage(usage)));
    }
    signals
}

fn anthropic_usage(usage: &Value) -> UsageUpdate {
    UsageUpdate {
        input_tokens: u64_at(usage, "/input_tokens"),
        output_tokens: u64_at(usage, "/output_tokens"),
        total_tokens: None,
        reasoning_tokens: None,
    }
}

impl AnthropicDecoder {
    fn decode_block_start(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let Some(index) = u64_at(payload, "/index") else {
            return Vec::new();
        };
        let Some(block) = payload.get("content_block") else {
            return Vec::new();
        };

        let mut signals = Vec::new();
        let kind = match str_at(block, "type").unwrap_or_default() {
            "text" => {
                if let Some(text) = non_empty(str_at(block, "text")) {
                    signals.push(StreamSignal::TextDelta {
                        id: Some(index.to_string()),
                        delta: text,
                    });
                }
                Block::Text
            }
            "thinking" | "redacted_thinking" => Block::Thinking,
            block_type @ ("tool_use" | "server_tool_use") => {
                let Some(id) = non_empty(str_at(block, "id")) else {
                    return signals;
                };
                signals.push(StreamSignal::ToolFragment(ToolFragment {
                    id: Some(id.clone()),
                    index: Some(index),
                    name: non_empty(str_at(block, "name")),
                    provider_executed: block_type == "server_tool_use",
                    ..Default::default()
                }));
                Block::ToolUse { id }
            }
            block_type if block_type.ends_with("_tool_result") => {
                if let Some(call_id) = non_empty(str_at(block, "tool_use_id")) {
                    signals.push(StreamSignal::ToolOutput {
                        call_id,
                        output: block.get("content").cloned().unwrap_or(Value::Null),
                        provider_executed: true,
                    });
                }
                Block::Other
            }
            _ => Block::Other,
        };
        self.blocks.insert(index, kind);
        signals
    }

    fn decode_block_delta(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let Some(index) = u64_at(payload, "/index") else {
            return Vec::new();
        };
        let Some(delta) = payload.get("delta") else {
            return Vec::new();
        };

        match str_at(delta, "type").unwrap_or_default() {
            "text_delta" => non_empty(str_at(delta, "text"))
                .map(|text| StreamSignal::TextDelta {
                    id: Some(index.to_string()),
                    delta: text,
                })
                .into_iter()
                .collect(),
            "thinking_delta" => non_empty(str_at(delta, "thinking"))
                .map(|thinking| StreamSignal::ReasoningDelta {
                    id: Some(index.to_string()),
                    delta: thinking,
                })
                .into_iter()
                .collect(),
            "input_json_delta" => {
                let id = match self.blocks.get(&index) {
                    Some(Block::ToolUse { id }) => Some(id.clone()),
                    _ => None,
                };
                non_empty(str_at(delta, "partial_json"))
                    .map(|arguments| {
                        StreamSignal::ToolFragment(ToolFragment {
                            id,
                            index: Some(index),
                            arguments: Some(arguments),
                            ..Default::default()
                        })
                    })
                    .into_iter()
                    .collect()
            }
            // signature_delta, citations_delta
            _ => Vec::new(),
        }
    }

    fn decode_block_stop(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let Some(index) = u64_at(payload, "/index") else {
            return Vec::new();
        };
        match self.blocks.remove(&index) {
            Some(Block::Text) => vec![StreamSignal::TextDone {
                id: Some(index.to_string()),
            }],
            Some(Block::Thinking) => vec![StreamSignal::ReasoningDone {
                id: Some(index.to_string()),
            }],
            Some(Block::ToolUse { id }) => vec![StreamSignal::ToolArgumentsDone {
                id: Some(id),
                index: Some(index),
            }],
            Some(Block::Other) | None => Vec::new(),
        }
    }
}
