//! Tool-call fragment correlation.
//!
//! Vendors stream a tool call as many fragments that may carry an id, a positional
//! index, the function name and a slice of argument text, in any combination. The
//! accumulator groups fragments by correlation key, announces the call once its name
//! is known and emits the structured input once the argument text parses.

use std::collections::HashMap;

use serde_json::{Value, json};

use crate::streaming::ToolFragment;
use crate::types::StreamPart;

/// What to do with argument text that is not JSON object/array syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgumentPolicy {
    /// Surface it as `{"value": "<raw text>"}`.
    #[default]
    Wrap,
    /// Treat it as invalid; the call is dropped at end of stream.
    Reject,
}

/// Outcome of interpreting buffered argument text.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentParse {
    /// Nothing usable (blank or a bare quote).
    Empty,
    Complete(Value),
    /// Structured text that ended early; more fragments may still arrive.
    Incomplete,
    Invalid,
}

/// Interpret argument text without consuming it.
pub fn parse_arguments(raw: &str, policy: ArgumentPolicy) -> ArgumentParse {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "\"" || trimmed == "\"\"" {
        return ArgumentParse::Empty;
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => ArgumentParse::Complete(value),
            Err(e) if e.is_eof() => ArgumentParse::Incomplete,
            Err(_) => ArgumentParse::Invalid,
        };
    }

    match policy {
        ArgumentPolicy::Wrap => ArgumentParse::Complete(json!({ "value": trimmed })),
        ArgumentPolicy::Reject => ArgumentParse::Invalid,
    }
}

/// Best-effort interpretation used at end of stream, when no more text can arrive.
fn force_arguments(raw: &str, policy: ArgumentPolicy) -> Option<Value> {
    match parse_arguments(raw, policy) {
        ArgumentParse::Complete(value) => Some(value),
        ArgumentParse::Empty => None,
        ArgumentParse::Incomplete | ArgumentParse::Invalid => match policy {
            ArgumentPolicy::Wrap => Some(json!({ "value": raw.trim() })),
            ArgumentPolicy::Reject => None,
        },
    }
}

fn index_key(index: u64) -> String {
    format!("idx:{index}")
}

/// Fragments of one tool call seen so far.
#[derive(Debug, Clone)]
pub struct ToolCallBuffer {
    pub key: String,
    pub name: Option<String>,
    pub arguments: String,
    pub order_index: u64,
    /// Call id surfaced on canonical parts, fixed when `ToolCallStart` is emitted.
    pub call_id: Option<String>,
    pub provider_executed: bool,
    pub title: Option<String>,
    sequence: u64,
}

impl ToolCallBuffer {
    fn new(key: String, order_index: u64, sequence: u64) -> Self {
        Self {
            key,
            name: None,
            arguments: String::new(),
            order_index,
            call_id: None,
            provider_executed: false,
            title: None,
            sequence,
        }
    }

    pub fn name_announced(&self) -> bool {
        self.call_id.is_some()
    }

    /// Fold a buffer that was tracked under another key into this one.
    fn absorb(&mut self, other: ToolCallBuffer) {
        if other.sequence < self.sequence {
            self.arguments = other.arguments + &self.arguments;
            self.order_index = other.order_index;
            self.sequence = other.sequence;
        } else {
            self.arguments.push_str(&other.arguments);
        }
        if self.name.is_none() {
            self.name = other.name;
        }
        if self.call_id.is_none() {
            self.call_id = other.call_id;
        }
        if self.title.is_none() {
            self.title = other.title;
        }
        self.provider_executed |= other.provider_executed;
    }
}

/// Correlates tool-call fragments for one upstream call.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    buffers: HashMap<String, ToolCallBuffer>,
    aliases: HashMap<u64, String>,
    last_key: Option<String>,
    next_sequence: u64,
    policy: ArgumentPolicy,
    emit_argument_deltas: bool,
    client_calls_ready: usize,
}

impl ToolCallAccumulator {
    pub fn new(policy: ArgumentPolicy, emit_argument_deltas: bool) -> Self {
        Self {
            policy,
            emit_argument_deltas,
            ..Default::default()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.buffers.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ToolCallBuffer> {
        self.buffers.values()
    }

    /// Number of `ToolCallReady` parts emitted for caller-executed tools.
    pub fn client_calls_ready(&self) -> usize {
        self.client_calls_ready
    }

    /// Record one fragment and return the parts it makes available.
    pub fn apply_fragment(&mut self, fragment: ToolFragment) -> Vec<StreamPart> {
        let id = fragment.id.as_deref().filter(|id| !id.is_empty());
        let key = self.resolve_key(id, fragment.index);
        self.last_key = Some(key.clone());

        let sequence = self.next_sequence;
        let buffer = self.buffers.entry(key.clone()).or_insert_with(|| {
            ToolCallBuffer::new(key.clone(), fragment.index.unwrap_or(sequence), sequence)
        });
        if buffer.sequence == sequence {
            self.next_sequence += 1;
        }

        buffer.provider_executed |= fragment.provider_executed;
        if buffer.title.is_none() {
            buffer.title = fragment.title;
        }
        if buffer.name.is_none() {
            buffer.name = fragment.name.filter(|name| !name.is_empty());
        }

        let mut parts = Vec::new();
        if !buffer.name_announced()
            && let Some(name) = buffer.name.clone()
        {
            let call_id = buffer.key.clone();
            buffer.call_id = Some(call_id.clone());
            parts.push(StreamPart::ToolCallStart {
                call_id: call_id.clone(),
                name,
                provider_executed: buffer.provider_executed,
                title: buffer.title.clone(),
            });
            if self.emit_argument_deltas && !buffer.arguments.is_empty() {
                parts.push(StreamPart::ToolCallArgsDelta {
                    call_id,
                    delta: buffer.arguments.clone(),
                });
            }
        }

        if let Some(arguments) = fragment.arguments.filter(|a| !a.is_empty()) {
            buffer.arguments.push_str(&arguments);
            if self.emit_argument_deltas
                && let Some(call_id) = &buffer.call_id
            {
                parts.push(StreamPart::ToolCallArgsDelta {
                    call_id: call_id.clone(),
                    delta: arguments,
                });
            }
        }

        parts
    }

    /// Handle an explicit "arguments done" signal.
    ///
    /// Incomplete or invalid text keeps buffering; only end of stream gives up on it.
    pub fn finalize(&mut self, id: Option<&str>, index: Option<u64>) -> Vec<StreamPart> {
        let key = self.lookup_key(id.filter(|id| !id.is_empty()), index);
        let Some(buffer) = self.buffers.get(&key) else {
            tracing::debug!(key = %key, "arguments done for unknown tool call");
            return Vec::new();
        };
        if buffer.name.is_none() {
            tracing::debug!(key = %key, "arguments done before tool name was known; keep buffering");
            return Vec::new();
        }

        match parse_arguments(&buffer.arguments, self.policy) {
            ArgumentParse::Complete(input) => match self.remove(&key) {
                Some(buffer) => self.ready(buffer, input).into_iter().collect(),
                None => Vec::new(),
            },
            ArgumentParse::Empty => {
                tracing::debug!(key = %key, "dropping tool call without arguments");
                self.remove(&key);
                Vec::new()
            }
            ArgumentParse::Incomplete | ArgumentParse::Invalid => {
                tracing::debug!(key = %key, "tool arguments not parseable yet; keep buffering");
                Vec::new()
            }
        }
    }

    /// End-of-stream flush in ascending first-seen order.
    pub fn flush_all(&mut self) -> Vec<StreamPart> {
        let mut buffers: Vec<_> = self.buffers.drain().map(|(_, b)| b).collect();
        self.aliases.clear();
        self.last_key = None;
        buffers.sort_by_key(|b| (b.order_index, b.sequence));

        let mut parts = Vec::new();
        for buffer in buffers {
            if buffer.name.is_none() {
                tracing::warn!(key = %buffer.key, "dropping nameless tool call at end of stream");
                continue;
            }
            match force_arguments(&buffer.arguments, self.policy) {
                Some(input) => parts.extend(self.ready(buffer, input)),
                None if buffer.arguments.trim().is_empty() => {
                    tracing::debug!(key = %buffer.key, "dropping tool call without arguments");
                }
                None => {
                    tracing::warn!(
                        key = %buffer.key,
                        arguments = %buffer.arguments,
                        "dropping tool call with unusable arguments"
                    );
                }
            }
        }
        parts
    }

    fn ready(&mut self, buffer: ToolCallBuffer, input: Value) -> Option<StreamPart> {
        let name = buffer.name?;
        // A buffer re-keyed by a late id keeps its announced positional id.
        let (call_id, provider_call_id) = match buffer.call_id {
            Some(announced) if announced != buffer.key && !buffer.key.starts_with("idx:") => {
                (announced, Some(buffer.key))
            }
            Some(announced) => (announced, None),
            None => (buffer.key, None),
        };
        if !buffer.provider_executed {
            self.client_calls_ready += 1;
        }
        Some(StreamPart::ToolCallReady {
            call_id,
            name,
            input,
            provider_executed: buffer.provider_executed,
            provider_call_id,
        })
    }

    fn remove(&mut self, key: &str) -> Option<ToolCallBuffer> {
        self.aliases.retain(|_, aliased| aliased != key);
        if self.last_key.as_deref() == Some(key) {
            self.last_key = None;
        }
        self.buffers.remove(key)
    }

    fn lookup_key(&self, id: Option<&str>, index: Option<u64>) -> String {
        match (id, index) {
            (Some(id), _) => id.to_string(),
            (None, Some(index)) => self
                .aliases
                .get(&index)
                .cloned()
                .unwrap_or_else(|| index_key(index)),
            (None, None) => self.last_key.clone().unwrap_or_else(|| index_key(0)),
        }
    }

    fn resolve_key(&mut self, id: Option<&str>, index: Option<u64>) -> String {
        let (Some(id), Some(index)) = (id, index) else {
            return self.lookup_key(id, index);
        };

        match self.aliases.get(&index) {
            None => {
                self.aliases.insert(index, id.to_string());
                // Late id: adopt whatever was buffered under the positional key.
                if let Some(mut positional) = self.buffers.remove(&index_key(index)) {
                    positional.key = id.to_string();
                    match self.buffers.get_mut(id) {
                        Some(existing) => existing.absorb(positional),
                        None => {
                            self.buffers.insert(id.to_string(), positional);
                        }
                    }
                }
            }
            Some(existing) if existing != id => {
                tracing::debug!(index, kept = %existing, ignored = %id, "index already aliased");
            }
            Some(_) => {}
        }
        id.to_string()
    }
}
