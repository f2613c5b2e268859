//! OpenAI chat-completions streaming payloads.
//!
//! Also covers the compatible vendors (DeepSeek, Groq, xAI, OpenRouter, ...), whose
//! reasoning text appears as `reasoning_content`, `reasoning` or `thinking`.

use serde_json::Value;

use super::{PayloadDecoder, error_message, non_empty, openai_usage, str_at};
use crate::streaming::{StreamSignal, ToolFragment};
use crate::types::FinishReason;

const REASONING_FIELDS: [&str; 3] = ["reasoning_content", "reasoning", "thinking"];

pub fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "tool_calls" | "function_call" => FinishReason::ToolCalls,
        "content_filter" => FinishReason::ContentFilter,
        other => FinishReason::Other(other.to_string()),
    }
}

#[derive(Debug, Default)]
pub struct OpenAiChatDecoder {
    in_reasoning: bool,
    model_reported: bool,
}

impl PayloadDecoder for OpenAiChatDecoder {
    fn decode(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let mut signals = Vec::new();

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            signals.push(StreamSignal::Error {
                message: error_message(error),
            });
            return signals;
        }

        if !self.model_reported
            && let Some(model) = non_empty(str_at(payload, "model"))
        {
            self.model_reported = true;
            signals.push(StreamSignal::Model(model));
        }

        if let Some(usage) = payload.get("usage").filter(|u| u.is_object()) {
            signals.push(StreamSignal::Usage(openai_usage(usage)));
        }

        let Some(choice) = payload
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
        else {
            return signals;
        };

        if let Some(delta) = choice.get("delta") {
            self.decode_delta(delta, &mut signals);
        }

        if let Some(reason) = str_at(choice, "finish_reason") {
            signals.push(StreamSignal::FinishReason(map_finish_reason(reason)));
        }

        signals
    }
}

impl OpenAiChatDecoder {
    fn decode_delta(&mut self, delta: &Value, signals: &mut Vec<StreamSignal>) {
        let reasoning = REASONING_FIELDS
            .iter()
            .find_map(|field| non_empty(str_at(delta, field)));
        if let Some(reasoning) = reasoning {
            self.in_reasoning = true;
            signals.push(StreamSignal::ReasoningDelta {
                id: None,
                delta: reasoning,
            });
        }

        if let Some(content) = non_empty(str_at(delta, "content")) {
            if self.in_reasoning {
                self.in_reasoning = false;
                signals.push(StreamSignal::ReasoningDone { id: None });
            }
            signals.push(StreamSignal::TextDelta {
                id: None,
                delta: content,
            });
        }

        let Some(tool_calls) = delta.get("tool_calls").and_then(Value::as_array) else {
            return;
        };
        for (position, call) in tool_calls.iter().enumerate() {
            let function = call.get("function");
            signals.push(StreamSignal::ToolFragment(ToolFragment {
                id: non_empty(str_at(call, "id")),
                index: call
                    .get("index")
                    .and_then(Value::as_u64)
                    .or(Some(position as u64)),
                name: function.and_then(|f| non_empty(str_at(f, "name"))),
                arguments: function.and_then(|f| non_empty(str_at(f, "arguments"))),
                ..Default::default()
            }));
        }
    }
}
