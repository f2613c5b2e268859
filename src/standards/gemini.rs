//! Gemini `streamGenerateContent?alt=sse` payloads.
//!
//! Gemini sends whole parts rather than deltas of a part: a `functionCall` arrives
//! complete in one payload, and there is no terminal sentinel or completion event.

use serde_json::{Value, json};

use super::{PayloadDecoder, error_message, non_empty, str_at, u64_at};
use crate::streaming::{StreamSignal, ToolFragment, UsageUpdate};
use crate::types::FinishReason;

const CODE_EXECUTION_TOOL: &str = "code_execution";

pub fn map_finish_reason(reason: &str, saw_function_call: bool) -> FinishReason {
    match reason {
        "STOP" if saw_function_call => FinishReason::ToolCalls,
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        "MALFORMED_FUNCTION_CALL" => FinishReason::Error,
        other => FinishReason::Other(other.to_ascii_lowercase()),
    }
}

#[derive(Debug, Default)]
pub struct GeminiDecoder {
    next_index: u64,
    saw_function_call: bool,
    in_reasoning: bool,
    model_reported: bool,
    last_code_call: Option<String>,
}

impl PayloadDecoder for GeminiDecoder {
    fn decode(&mut self, payload: &Value) -> Vec<StreamSignal> {
        let mut signals = Vec::new();

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            signals.push(StreamSignal::Error {
                message: error_message(error),
            });
            return signals;
        }

        if !self.model_reported
            && let Some(model) = non_empty(str_at(payload, "modelVersion"))
        {
            self.model_reported = true;
            signals.push(StreamSignal::Model(model));
        }

        let candidate = payload
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first());

        if let Some(parts) = candidate
            .and_then(|c| c.pointer("/content/parts"))
            .and_then(Value::as_array)
        {
            for part in parts {
                self.decode_part(part, &mut signals);
            }
        }

        if let Some(usage) = payload.get("usageMetadata") {
            signals.push(StreamSignal::Usage(UsageUpdate {
                input_tokens: u64_at(usage, "/promptTokenCount"),
                output_tokens: u64_at(usage, "/candidatesTokenCount"),
                total_tokens: u64_at(usage, "/totalTokenCount"),
                reasoning_tokens: u64_at(usage, "/thoughtsTokenCount"),
            }));
        }

        if let Some(reason) = candidate.and_then(|c| str_at(c, "finishReason")) {
            signals.push(StreamSignal::FinishReason(map_finish_reason(
                reason,
                self.saw_function_call,
            )));
        }

        signals
    }
}

impl GeminiDecoder {
    fn decode_part(&mut self, part: &Value, signals: &mut Vec<StreamSignal>) {
        if let Some(text) = non_empty(str_at(part, "text")) {
            if part.get("thought").and_then(Value::as_bool).unwrap_or(false) {
                self.in_reasoning = true;
                signals.push(StreamSignal::ReasoningDelta {
                    id: None,
                    delta: text,
                });
            } else {
                self.close_reasoning(signals);
                signals.push(StreamSignal::TextDelta {
                    id: None,
                    delta: text,
                });
            }
            return;
        }

        if let Some(call) = part.get("functionCall") {
            self.close_reasoning(signals);
            self.saw_function_call = true;
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            self.whole_tool_call(
                non_empty(str_at(call, "id")),
                str_at(call, "name").unwrap_or_default(),
                &args,
                false,
                signals,
            );
            return;
        }

        if let Some(code) = part.get("executableCode") {
            let call_id = self.whole_tool_call(None, CODE_EXECUTION_TOOL, code, true, signals);
            self.last_code_call = Some(call_id);
            return;
        }

        if let Some(result) = part.get("codeExecutionResult")
            && let Some(call_id) = self.last_code_call.take()
        {
            signals.push(StreamSignal::ToolOutput {
                call_id,
                output: result.clone(),
                provider_executed: true,
            });
        }
    }

    /// A complete call still goes through fragment then done, so Start precedes Ready.
    fn whole_tool_call(
        &mut self,
        id: Option<String>,
        name: &str,
        args: &Value,
        provider_executed: bool,
        signals: &mut Vec<StreamSignal>,
    ) -> String {
        let index = self.next_index;
        self.next_index += 1;
        let id = id.unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));

        signals.push(StreamSignal::ToolFragment(ToolFragment {
            id: Some(id.clone()),
            index: Some(index),
            name: Some(name.to_string()),
            arguments: Some(args.to_string()),
            provider_executed,
            title: None,
        }));
        signals.push(StreamSignal::ToolArgumentsDone {
            id: Some(id.clone()),
            index: Some(index),
        });
        id
    }

    fn close_reasoning(&mut self, signals: &mut Vec<StreamSignal>) {
        if self.in_reasoning {
            self.in_reasoning = false;
            signals.push(StreamSignal::ReasoningDone { id: None });
        }
    }
}
