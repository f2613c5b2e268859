//! Stream normalizer
//!
//! One `StreamNormalizer` serves exactly one upstream call. It decodes each vendor
//! payload into `StreamSignal`s and runs them through a state machine that owns
//! text/reasoning bracketing, tool-call correlation and finish bookkeeping.

use std::collections::HashSet;

use serde_json::Value;

use crate::standards::{PayloadDecoder, ProviderFamily};
use crate::streaming::{ArgumentPolicy, StreamSignal, ToolCallAccumulator, UsageUpdate};
use crate::types::{FinishReason, StreamPart};

/// Per-call normalizer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    pub argument_policy: ArgumentPolicy,
    /// Emit `ToolCallArgsDelta` parts while arguments stream in.
    pub emit_argument_deltas: bool,
    /// Model id reported on `Finish` when the feed never names one.
    pub model: Option<String>,
    /// Request temperature echoed on `Finish`.
    pub temperature: Option<f64>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            argument_policy: ArgumentPolicy::Wrap,
            emit_argument_deltas: true,
            model: None,
            temperature: None,
        }
    }
}

impl NormalizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_argument_policy(mut self, policy: ArgumentPolicy) -> Self {
        self.argument_policy = policy;
        self
    }

    pub fn with_argument_deltas(mut self, enabled: bool) -> Self {
        self.emit_argument_deltas = enabled;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    Reasoning,
}

impl BlockKind {
    fn prefix(self) -> &'static str {
        match self {
            BlockKind::Text => "txt",
            BlockKind::Reasoning => "rsn",
        }
    }

    fn start(self, id: String) -> StreamPart {
        match self {
            BlockKind::Text => StreamPart::TextStart { id },
            BlockKind::Reasoning => StreamPart::ReasoningStart { id },
        }
    }

    fn delta(self, id: String, delta: String) -> StreamPart {
        match self {
            BlockKind::Text => StreamPart::TextDelta { id, delta },
            BlockKind::Reasoning => StreamPart::ReasoningDelta { id, delta },
        }
    }

    fn end(self, id: String) -> StreamPart {
        match self {
            BlockKind::Text => StreamPart::TextEnd { id },
            BlockKind::Reasoning => StreamPart::ReasoningEnd { id },
        }
    }
}

#[derive(Debug)]
struct OpenBlock {
    id: String,
    vendor_id: Option<String>,
}

/// Bracketing state of one channel. At most one block is open at a time.
#[derive(Debug)]
struct BlockState {
    kind: BlockKind,
    open: Option<OpenBlock>,
    used_ids: HashSet<String>,
}

impl BlockState {
    fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            open: None,
            used_ids: HashSet::new(),
        }
    }

    fn delta(&mut self, vendor_id: Option<String>, delta: String) -> Vec<StreamPart> {
        if delta.is_empty() {
            return Vec::new();
        }

        let mut parts = Vec::new();
        let switching = match (&self.open, &vendor_id) {
            (Some(open), Some(_)) => open.vendor_id != vendor_id,
            _ => false,
        };
        if switching {
            parts.extend(self.close());
        }

        let id = match &self.open {
            Some(open) => open.id.clone(),
            None => {
                let id = self.allocate_id(vendor_id.as_deref());
                parts.push(self.kind.start(id.clone()));
                self.open = Some(OpenBlock {
                    id: id.clone(),
                    vendor_id,
                });
                id
            }
        };
        parts.push(self.kind.delta(id, delta));
        parts
    }

    /// Close the open block if `vendor_id` is `None` or names it.
    fn done(&mut self, vendor_id: Option<&str>) -> Vec<StreamPart> {
        match (&self.open, vendor_id) {
            (Some(_), None) => self.close(),
            (Some(open), Some(id)) if open.vendor_id.as_deref() == Some(id) => self.close(),
            _ => Vec::new(),
        }
    }

    fn close(&mut self) -> Vec<StreamPart> {
        self.open
            .take()
            .map(|open| self.kind.end(open.id))
            .into_iter()
            .collect()
    }

    fn allocate_id(&mut self, vendor_id: Option<&str>) -> String {
        let base = match vendor_id {
            Some(id) => id.to_string(),
            None => format!("{}-{}", self.kind.prefix(), uuid::Uuid::new_v4().simple()),
        };
        let mut id = base.clone();
        let mut n = 1;
        while self.used_ids.contains(&id) {
            id = format!("{base}-{n}");
            n += 1;
        }
        self.used_ids.insert(id.clone());
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Streaming,
    Finished,
    Failed,
}

/// Per-call state machine from vendor payloads to canonical parts.
pub struct StreamNormalizer {
    decoder: Box<dyn PayloadDecoder>,
    config: NormalizerConfig,
    text: BlockState,
    reasoning: BlockState,
    tools: ToolCallAccumulator,
    usage: UsageUpdate,
    finish_reason: Option<FinishReason>,
    model: Option<String>,
    phase: Phase,
}

impl std::fmt::Debug for StreamNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamNormalizer")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("finish_reason", &self.finish_reason)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl StreamNormalizer {
    pub fn new(family: ProviderFamily) -> Self {
        Self::with_config(family, NormalizerConfig::default())
    }

    pub fn with_config(family: ProviderFamily, config: NormalizerConfig) -> Self {
        Self::with_decoder(family.decoder(), config)
    }

    /// Build around a custom decoder (vendors outside the built-in families).
    pub fn with_decoder(decoder: Box<dyn PayloadDecoder>, config: NormalizerConfig) -> Self {
        Self {
            decoder,
            tools: ToolCallAccumulator::new(config.argument_policy, config.emit_argument_deltas),
            config,
            text: BlockState::new(BlockKind::Text),
            reasoning: BlockState::new(BlockKind::Reasoning),
            usage: UsageUpdate::default(),
            finish_reason: None,
            model: None,
            phase: Phase::Streaming,
        }
    }

    /// `Finish` or `StreamError` has been emitted; further input is ignored.
    pub fn is_terminated(&self) -> bool {
        self.phase != Phase::Streaming
    }

    /// Decode one vendor payload and advance the state machine.
    pub fn normalize(&mut self, payload: &Value) -> Vec<StreamPart> {
        if self.is_terminated() {
            tracing::trace!("payload after termination ignored");
            return Vec::new();
        }

        let mut parts = Vec::new();
        for signal in self.decoder.decode(payload) {
            parts.extend(self.apply(signal));
            if self.is_terminated() {
                break;
            }
        }
        parts
    }

    /// Advance the state machine by one decoded signal.
    pub fn apply(&mut self, signal: StreamSignal) -> Vec<StreamPart> {
        if self.is_terminated() {
            return Vec::new();
        }

        match signal {
            StreamSignal::TextDelta { id, delta } => self.text.delta(id, delta),
            StreamSignal::TextDone { id } => self.text.done(id.as_deref()),
            StreamSignal::ReasoningDelta { id, delta } => self.reasoning.delta(id, delta),
            StreamSignal::ReasoningDone { id } => self.reasoning.done(id.as_deref()),
            StreamSignal::ToolFragment(fragment) => self.tools.apply_fragment(fragment),
            StreamSignal::ToolArgumentsDone { id, index } => {
                self.tools.finalize(id.as_deref(), index)
            }
            StreamSignal::ToolApprovalRequested {
                call_id,
                approval_id,
            } => vec![StreamPart::ToolApprovalRequested {
                call_id,
                approval_id,
            }],
            StreamSignal::ToolOutput {
                call_id,
                output,
                provider_executed,
            } => vec![StreamPart::ToolOutputAvailable {
                call_id,
                output,
                provider_executed,
            }],
            StreamSignal::Usage(update) => {
                self.usage.merge(update);
                Vec::new()
            }
            StreamSignal::FinishReason(reason) => {
                self.finish_reason = Some(reason);
                Vec::new()
            }
            StreamSignal::Model(model) => {
                if !model.is_empty() {
                    self.model = Some(model);
                }
                Vec::new()
            }
            StreamSignal::Completed => self.complete(),
            StreamSignal::Error { message } => self.fail(message),
        }
    }

    /// End-of-stream flush. Idempotent; does nothing once terminated.
    pub fn finish(&mut self) -> Vec<StreamPart> {
        if self.is_terminated() {
            return Vec::new();
        }
        tracing::debug!("feed ended without completion signal; flushing");
        self.complete()
    }

    fn complete(&mut self) -> Vec<StreamPart> {
        let mut parts = self.close_blocks();
        parts.extend(self.tools.flush_all());

        let finish_reason = self.finish_reason.clone().unwrap_or_else(|| {
            if self.tools.client_calls_ready() > 0 {
                FinishReason::ToolCalls
            } else {
                FinishReason::Unknown
            }
        });
        let usage = self.usage.resolve();
        tracing::debug!(
            finish_reason = %finish_reason,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "stream finished"
        );

        parts.push(StreamPart::Finish {
            finish_reason,
            model: self.model.clone().or_else(|| self.config.model.clone()),
            usage,
            temperature: self.config.temperature,
        });
        self.phase = Phase::Finished;
        parts
    }

    fn fail(&mut self, message: String) -> Vec<StreamPart> {
        let mut parts = self.close_blocks();
        if self.tools.has_pending() {
            tracing::debug!(
                pending = self.tools.pending().count(),
                "discarding buffered tool calls after upstream error"
            );
        }
        tracing::warn!(message = %message, "upstream reported an error in stream");
        parts.push(StreamPart::StreamError { message });
        self.phase = Phase::Failed;
        parts
    }

    fn close_blocks(&mut self) -> Vec<StreamPart> {
        let mut parts = self.reasoning.close();
        parts.extend(self.text.close());
        parts
    }
}
