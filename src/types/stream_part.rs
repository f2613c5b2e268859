//! Canonical stream parts.
//!
//! One `StreamPart` is one canonical event. The normalizer guarantees the
//! ordering contract; this module only defines the shapes:
//! - `ToolCallStart` precedes every `ToolCallArgsDelta` / `ToolCallReady` of the same call.
//! - `TextStart` / `TextEnd` bracket all `TextDelta`s sharing an id (same for reasoning).
//! - A feed ends with exactly one `Finish` or one `StreamError`.
//!
//! Parts serialize with a kebab-case `type` tag and camelCase fields so they can be
//! re-emitted as `data: ...` frames without a mapping layer.

use serde::{Deserialize, Serialize};

/// Why generation stopped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
    Other(String),
    #[default]
    Unknown,
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ToolCalls => "tool-calls",
            FinishReason::ContentFilter => "content-filter",
            FinishReason::Error => "error",
            FinishReason::Other(raw) => raw,
            FinishReason::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        reason.as_str().to_string()
    }
}

impl From<String> for FinishReason {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "tool-calls" => FinishReason::ToolCalls,
            "content-filter" => FinishReason::ContentFilter,
            "error" => FinishReason::Error,
            "unknown" => FinishReason::Unknown,
            _ => FinishReason::Other(raw),
        }
    }
}

/// Token accounting carried by `Finish`.
///
/// The three counters are always present; upstream gaps are reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

/// Canonical event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum StreamPart {
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ReasoningStart {
        id: String,
    },
    ReasoningDelta {
        id: String,
        delta: String,
    },
    ReasoningEnd {
        id: String,
    },
    ToolCallStart {
        call_id: String,
        name: String,
        provider_executed: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    ToolCallArgsDelta {
        call_id: String,
        delta: String,
    },
    ToolCallReady {
        call_id: String,
        name: String,
        input: serde_json::Value,
        provider_executed: bool,
        /// Vendor id learned after `ToolCallStart` announced a positional `call_id`.
        /// Tool results sent back upstream must reference this id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_call_id: Option<String>,
    },
    ToolApprovalRequested {
        call_id: String,
        approval_id: String,
    },
    ToolOutputAvailable {
        call_id: String,
        output: serde_json::Value,
        provider_executed: bool,
    },
    Finish {
        finish_reason: FinishReason,
        model: Option<String>,
        usage: Usage,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        temperature: Option<f64>,
    },
    StreamError {
        message: String,
    },
}

impl StreamPart {
    /// `Finish` and `StreamError` end a canonical feed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamPart::Finish { .. } | StreamPart::StreamError { .. })
    }

    /// Tool call id for tool lifecycle parts.
    pub fn call_id(&self) -> Option<&str> {
        match self {
            StreamPart::ToolCallStart { call_id, .. }
            | StreamPart::ToolCallArgsDelta { call_id, .. }
            | StreamPart::ToolCallReady { call_id, .. }
            | StreamPart::ToolApprovalRequested { call_id, .. }
            | StreamPart::ToolOutputAvailable { call_id, .. } => Some(call_id),
            _ => None,
        }
    }

    /// Format as an SSE `data:` frame.
    pub fn to_sse_frame(&self) -> Result<String, crate::error::LlmError> {
        let json = serde_json::to_string(self)?;
        Ok(format!("data: {json}\n\n"))
    }
}
