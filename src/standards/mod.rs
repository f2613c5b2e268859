//! Standards Layer
//!
//! Per-vendor knowledge lives here and nowhere else: how each API family shapes its
//! streaming payloads and its long-running task documents. Everything downstream of
//! a `PayloadDecoder` is vendor-neutral.

pub mod anthropic;
pub mod gemini;
pub mod openai_chat;
pub mod openai_responses;
pub mod tasks;

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::LlmError;
use crate::streaming::{FrameProtocol, StreamSignal, UsageUpdate};

pub use anthropic::AnthropicDecoder;
pub use gemini::GeminiDecoder;
pub use openai_chat::OpenAiChatDecoder;
pub use openai_responses::OpenAiResponsesDecoder;
pub use tasks::TaskFamily;

/// Translates one vendor payload into vendor-neutral signals.
///
/// Implementations may keep per-call state (block types by index, ids by position);
/// one decoder instance serves exactly one upstream call. Unknown payload shapes
/// decode to an empty vector.
pub trait PayloadDecoder: Send {
    fn decode(&mut self, payload: &Value) -> Vec<StreamSignal>;
}

/// Static identifier of a streaming API family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    /// OpenAI chat completions and the many compatible vendors.
    OpenAiChat,
    OpenAiResponses,
    Anthropic,
    Gemini,
}

impl ProviderFamily {
    pub fn decoder(self) -> Box<dyn PayloadDecoder> {
        match self {
            ProviderFamily::OpenAiChat => Box::new(OpenAiChatDecoder::default()),
            ProviderFamily::OpenAiResponses => Box::new(OpenAiResponsesDecoder::default()),
            ProviderFamily::Anthropic => Box::new(AnthropicDecoder::default()),
            ProviderFamily::Gemini => Box::new(GeminiDecoder::default()),
        }
    }

    /// All families speak SSE; Anthropic and Gemini simply never send the sentinel.
    pub fn frame_protocol(self) -> FrameProtocol {
        FrameProtocol::sse()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderFamily::OpenAiChat => "openai-chat",
            ProviderFamily::OpenAiResponses => "openai-responses",
            ProviderFamily::Anthropic => "anthropic",
            ProviderFamily::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderFamily {
    type Err = LlmError;

    /// Accepts family names and common provider ids.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai-chat" | "openai" | "azure" | "deepseek" | "groq" | "xai" | "openrouter"
            | "together" | "siliconflow" | "moonshot" | "mistral" | "ollama" => {
                Ok(ProviderFamily::OpenAiChat)
            }
            "openai-responses" | "responses" => Ok(ProviderFamily::OpenAiResponses),
            "anthropic" | "claude" => Ok(ProviderFamily::Anthropic),
            "gemini" | "google" => Ok(ProviderFamily::Gemini),
            other => Err(LlmError::ConfigurationError(format!(
                "unknown provider family: {other}"
            ))),
        }
    }
}

pub(crate) fn str_at<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

pub(crate) fn u64_at(value: &Value, pointer: &str) -> Option<u64> {
    value.pointer(pointer).and_then(Value::as_u64)
}

pub(crate) fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Best-effort message out of a vendor error object (or bare string).
pub(crate) fn error_message(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        _ => str_at(error, "message")
            .or_else(|| error.pointer("/error/message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    }
}

/// `prompt_tokens`/`completion_tokens` and `input_tokens`/`output_tokens` spellings.
pub(crate) fn openai_usage(usage: &Value) -> UsageUpdate {
    UsageUpdate {
        input_tokens: u64_at(usage, "/prompt_tokens").or_else(|| u64_at(usage, "/input_tokens")),
        output_tokens: u64_at(usage, "/completion_tokens")
            .or_else(|| u64_at(usage, "/output_tokens")),
        total_tokens: u64_at(usage, "/total_tokens"),
        reasoning_tokens: u64_at(usage, "/completion_tokens_details/reasoning_tokens")
            .or_else(|| u64_at(usage, "/output_tokens_details/reasoning_tokens")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_ids_resolve_to_families() {
        assert_eq!("deepseek".parse::<ProviderFamily>().ok(), Some(ProviderFamily::OpenAiChat));
        assert_eq!("Anthropic".parse::<ProviderFamily>().ok(), Some(ProviderFamily::Anthropic));
        assert_eq!(
            ProviderFamily::OpenAiResponses.as_str().parse::<ProviderFamily>().ok(),
            Some(ProviderFamily::OpenAiResponses)
        );
        assert!(matches!(
            "nope".parse::<ProviderFamily>(),
            Err(LlmError::ConfigurationError(_))
        ));
    }

    #[test]
    fn error_message_handles_nested_and_bare_shapes() {
        assert_eq!(error_message(&json!({"message": "a"})), "a");
        assert_eq!(error_message(&json!({"error": {"message": "b"}})), "b");
        assert_eq!(error_message(&json!("c")), "c");
    }

    #[test]
    fn usage_accepts_both_spellings() {
        let chat = openai_usage(&json!({"prompt_tokens": 1, "completion_tokens": 2}));
        let responses = openai_usage(&json!({
            "input_tokens": 1,
            "output_tokens": 2,
            "output_tokens_details": {"reasoning_tokens": 1}
        }));
        assert_eq!(chat.input_tokens, responses.input_tokens);
        assert_eq!(chat.output_tokens, responses.output_tokens);
        assert_eq!(responses.reasoning_tokens, Some(1));
    }
}
