//! Vendor-neutral stream signals.
//!
//! Payload decoders translate one vendor JSON payload into zero or more
//! `StreamSignal`s; the normalizer owns everything stateful that follows.

use serde_json::Value;

use crate::types::FinishReason;

/// One decoded fact about the upstream feed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamSignal {
    /// Visible text. `id` is the vendor's block id, if it has one.
    TextDelta { id: Option<String>, delta: String },
    /// The vendor closed a text block. `None` closes whatever is open.
    TextDone { id: Option<String> },
    ReasoningDelta { id: Option<String>, delta: String },
    ReasoningDone { id: Option<String> },
    /// Partial tool call.
    ToolFragment(ToolFragment),
    /// The vendor declared a tool call's arguments complete.
    ToolArgumentsDone {
        id: Option<String>,
        index: Option<u64>,
    },
    ToolApprovalRequested {
        call_id: String,
        approval_id: String,
    },
    /// Result of a tool the provider executed itself.
    ToolOutput {
        call_id: String,
        output: Value,
        provider_executed: bool,
    },
    Usage(UsageUpdate),
    FinishReason(FinishReason),
    Model(String),
    /// Explicit end of generation.
    Completed,
    /// Upstream reported an error inside the feed.
    Error { message: String },
}

/// One piece of a tool call as it appears on the wire.
///
/// Any field may be absent; the accumulator correlates fragments by `id`,
/// then by positional `index`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolFragment {
    pub id: Option<String>,
    pub index: Option<u64>,
    pub name: Option<String>,
    pub arguments: Option<String>,
    pub provider_executed: bool,
    pub title: Option<String>,
}

impl ToolFragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    pub fn provider_executed(mut self, provider_executed: bool) -> Self {
        self.provider_executed = provider_executed;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Token counters reported so far. Later reports override earlier ones per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageUpdate {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub reasoning_tokens: Option<u64>,
}

impl UsageUpdate {
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.total_tokens.is_none()
            && self.reasoning_tokens.is_none()
    }

    pub fn merge(&mut self, other: UsageUpdate) {
        if other.input_tokens.is_some() {
            self.input_tokens = other.input_tokens;
        }
        if other.output_tokens.is_some() {
            self.output_tokens = other.output_tokens;
        }
        if other.total_tokens.is_some() {
            self.total_tokens = other.total_tokens;
        }
        if other.reasoning_tokens.is_some() {
            self.reasoning_tokens = other.reasoning_tokens;
        }
    }

    /// Resolve into reported usage. A missing total becomes input + output.
    pub fn resolve(&self) -> crate::types::Usage {
        let input_tokens = self.input_tokens.unwrap_or(0);
        let output_tokens = self.output_tokens.unwrap_or(0);
        crate::types::Usage {
            input_tokens,
            output_tokens,
            total_tokens: self
                .total_tokens
                .unwrap_or(input_tokens.saturating_add(output_tokens)),
            reasoning_tokens: self.reasoning_tokens,
        }
    }
}
