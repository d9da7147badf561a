//! Merge the turns of one exchange into a single assistant message.
//!
//! Pass 1 walks assistant turns in order, splitting text into text and code
//! artifact parts, normalizing reasoning, and recording each tool call in a
//! slot. Pass 2 walks tool turns and binds every result to its call through
//! the call-id index, appending a degraded entry when no call exists.

use std::collections::HashMap;

use serde_json::json;

use crate::fence::{DocumentIds, split_code_fences};
use crate::types::{
    FinalizedMessage, Part, ReasoningDetail, Role, ToolInvocation, ToolState, Turn,
};

/// Content used when an assistant message has no text at all
pub const PLACEHOLDER_CONTENT: &str = "Assistant message";

/// Separator between text segments in the plain-text projection
const TEXT_SEPARATOR: &str = "\n\n";

/// A recoverable data-quality problem found while reconciling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anomaly {
    /// A tool-invocation without a call id was dropped
    MissingInvocationId { turn: usize },
    /// A tool-result without a call id was dropped
    MissingResultId { turn: usize },
    /// A tool-result arrived with no matching tool-invocation
    OrphanResult { tool_call_id: String },
    /// A part of unrecognized type was ignored
    UnknownPart { turn: usize },
}

/// Options for a reconciliation run
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// How code artifacts get their document ids
    pub document_ids: DocumentIds,
}

/// Output of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Ordered, deduplicated parts ready to persist
    pub parts: Vec<Part>,
    /// Plain-text projection, never empty
    pub plain_text: String,
    /// Everything that was degraded or dropped along the way
    pub anomalies: Vec<Anomaly>,
}

impl Reconciliation {
    /// Build the assistant record to persist
    pub fn into_message(
        self,
        message_group_id: Option<String>,
        model: Option<String>,
    ) -> FinalizedMessage {
        FinalizedMessage {
            role: Role::Assistant,
            content: self.plain_text,
            parts: self.parts,
            message_group_id,
            model,
        }
    }
}

/// Reconciles the turns of one exchange
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ReconcileOptions,
}

/// Reconcile with default options.
///
/// Code artifacts get fresh random document ids, so two runs over the same
/// turns differ in `documentId` only. Use [`DocumentIds::Derived`] through
/// [`Reconciler::new`] when repeated runs must produce identical output.
pub fn reconcile(turns: &[Turn]) -> Reconciliation {
    Reconciler::default().reconcile(turns)
}

impl Reconciler {
    pub fn new(options: ReconcileOptions) -> Self {
        Self { options }
    }

    pub fn reconcile(&self, turns: &[Turn]) -> Reconciliation {
        let mut state = MergeState::default();

        for (index, turn) in turns.iter().enumerate() {
            if turn.role == Role::Assistant {
                for part in turn.parts() {
                    state.collect(index, part, self.options.document_ids);
                }
            }
        }

        for (index, turn) in turns.iter().enumerate() {
            if turn.role == Role::Tool {
                for part in turn.parts() {
                    if let Part::ToolResult {
                        tool_call_id,
                        tool_name,
                        result,
                    } = part
                    {
                        state.bind_result(index, tool_call_id, tool_name, result);
                    }
                }
            }
        }

        state.finish()
    }
}

/// Working state for one call: output slots plus the call-id index into them
#[derive(Default)]
struct MergeState {
    slots: Vec<Part>,
    tool_slots: HashMap<String, usize>,
    texts: Vec<String>,
    artifacts: usize,
    anomalies: Vec<Anomaly>,
}

impl MergeState {
    fn collect(&mut self, turn: usize, part: &Part, ids: DocumentIds) {
        match part {
            Part::Text { text } => {
                self.texts.push(text.clone());
                self.slots
                    .extend(split_code_fences(text, ids, &mut self.artifacts));
            }
            Part::ToolInvocation { .. } => {
                if let Some(invocation) = part.invocation() {
                    self.collect_call(turn, invocation);
                }
            }
            Part::Reasoning {
                text,
                reasoning,
                details,
            } => {
                let raw = text.clone().or_else(|| reasoning.clone()).unwrap_or_default();
                let details = match details {
                    Some(details) if text.is_none() => details.clone(),
                    _ => vec![ReasoningDetail::Text { text: raw.clone() }],
                };
                self.slots.push(Part::Reasoning {
                    text: None,
                    reasoning: Some(raw),
                    details: Some(details),
                });
            }
            Part::StepStart => self.slots.push(Part::StepStart),
            Part::CodeArtifact(_) => self.slots.push(part.clone()),
            Part::ToolResult { .. } | Part::Unknown => {
                tracing::debug!(turn, kind = part.kind(), "ignoring part in assistant turn");
                if matches!(part, Part::Unknown) {
                    self.anomalies.push(Anomaly::UnknownPart { turn });
                }
            }
        }
    }

    fn collect_call(&mut self, turn: usize, invocation: ToolInvocation) {
        let Some(id) = invocation.call_id().map(str::to_string) else {
            tracing::warn!(turn, "dropping tool-invocation without toolCallId");
            self.anomalies.push(Anomaly::MissingInvocationId { turn });
            return;
        };

        let mut entry = invocation;
        entry.tool_name = Some(entry.name().to_string());
        entry.args = Some(entry.args.take().unwrap_or_else(|| json!({})));

        match self.tool_slots.get(&id) {
            Some(&slot) => {
                if let Part::ToolInvocation {
                    tool_invocation: Some(existing),
                    ..
                } = &self.slots[slot]
                {
                    if existing.has_result() && !entry.has_result() {
                        entry.state = existing.state;
                        entry.result = existing.result.clone();
                    }
                }
                self.slots[slot] = Part::from(entry);
            }
            None => {
                self.tool_slots.insert(id, self.slots.len());
                self.slots.push(Part::from(entry));
            }
        }
    }

    fn bind_result(
        &mut self,
        turn: usize,
        tool_call_id: &Option<String>,
        tool_name: &Option<String>,
        result: &Option<serde_json::Value>,
    ) {
        let Some(id) = tool_call_id.as_deref().filter(|id| !id.is_empty()) else {
            tracing::warn!(turn, "dropping tool-result without toolCallId");
            self.anomalies.push(Anomaly::MissingResultId { turn });
            return;
        };

        if let Some(&slot) = self.tool_slots.get(id) {
            if let Part::ToolInvocation {
                tool_invocation: Some(tool_invocation),
                ..
            } = &mut self.slots[slot]
            {
                tool_invocation.state = Some(ToolState::Result);
                tool_invocation.result = result.clone();
            }
            return;
        }

        tracing::warn!(
            tool_call_id = id,
            "tool result found without a preceding tool-invocation"
        );
        self.anomalies.push(Anomaly::OrphanResult {
            tool_call_id: id.to_string(),
        });
        self.tool_slots.insert(id.to_string(), self.slots.len());
        self.slots.push(Part::from(ToolInvocation {
            state: Some(ToolState::Result),
            tool_call_id: Some(id.to_string()),
            tool_name: Some(tool_name.clone().unwrap_or_default()),
            result: result.clone(),
            ..Default::default()
        }));
    }

    fn finish(self) -> Reconciliation {
        let plain_text = self
            .texts
            .iter()
            .filter(|text| !text.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(TEXT_SEPARATOR);

        let plain_text = if plain_text.trim().is_empty() {
            PLACEHOLDER_CONTENT.to_string()
        } else {
            plain_text
        };

        Reconciliation {
            parts: self.slots,
            plain_text,
            anomalies: self.anomalies,
        }
    }
}
