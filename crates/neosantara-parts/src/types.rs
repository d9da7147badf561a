//! Core types for assistant message parts

use serde::{Deserialize, Deserializer, Serialize};

/// Message roles in a chat exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Get the role as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// Lifecycle state of a tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    /// Arguments still streaming in
    PartialCall,
    /// Call issued, no result yet
    Call,
    /// Result attached
    Result,
}

/// Read a field that is present, keeping an explicit `null` as `Some(Null)`
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// A tool call as carried inside a `tool-invocation` part.
///
/// Every field is optional on the wire: the streaming client may omit any of
/// them, and a stored part must serialize back exactly as it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ToolState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub args: Option<serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<serde_json::Value>,
}

impl ToolInvocation {
    /// The call id, if present and non-empty
    pub fn call_id(&self) -> Option<&str> {
        self.tool_call_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Tool name, or the empty string when unknown
    pub fn name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("")
    }

    /// Whether a result has been attached
    pub fn has_result(&self) -> bool {
        self.state == Some(ToolState::Result)
    }

    /// Fill fields missing here from `fallback`
    pub fn or(self, fallback: &ToolInvocation) -> ToolInvocation {
        ToolInvocation {
            state: self.state.or(fallback.state),
            step: self.step.or(fallback.step),
            tool_call_id: self.tool_call_id.or_else(|| fallback.tool_call_id.clone()),
            tool_name: self.tool_name.or_else(|| fallback.tool_name.clone()),
            args: self.args.or_else(|| fallback.args.clone()),
            result: self.result.or_else(|| fallback.result.clone()),
        }
    }
}

/// One entry in a reasoning part's `details` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReasoningDetail {
    Text { text: String },
}

/// A fenced code block promoted to its own part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeArtifact {
    pub document_id: String,
    pub title: String,
    pub language: String,
    pub code: String,
}

/// Content parts of a turn, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Part {
    /// Plain (markdown) text
    #[serde(rename = "text")]
    Text { text: String },

    /// Reasoning trace. Raw stream parts carry `text`; normalized parts
    /// carry `reasoning` and `details`.
    #[serde(rename = "reasoning")]
    Reasoning {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reasoning: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<Vec<ReasoningDetail>>,
    },

    /// Tool call, possibly with its result merged in. Stored parts nest the
    /// call under `toolInvocation`; some clients put its fields on the part.
    #[serde(rename = "tool-invocation")]
    ToolInvocation {
        #[serde(
            rename = "toolInvocation",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        tool_invocation: Option<ToolInvocation>,
        #[serde(flatten)]
        inline: ToolInvocation,
    },

    /// Tool output, delivered on a `tool` turn
    #[serde(rename = "tool-result", rename_all = "camelCase")]
    ToolResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        #[serde(
            default,
            deserialize_with = "present",
            skip_serializing_if = "Option::is_none"
        )]
        result: Option<serde_json::Value>,
    },

    /// Step boundary marker
    #[serde(rename = "step-start")]
    StepStart,

    /// Code block extracted from assistant text
    #[serde(rename = "code_artifact")]
    CodeArtifact(CodeArtifact),

    /// Any part type this crate does not know about
    #[serde(other, skip_serializing)]
    Unknown,
}

impl Part {
    /// Create text content
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a raw reasoning part as the streaming client emits it
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self::Reasoning {
            text: Some(text.into()),
            reasoning: None,
            details: None,
        }
    }

    /// Create a tool call in the `call` state
    pub fn tool_call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: serde_json::Value,
    ) -> Self {
        Self::from(ToolInvocation {
            state: Some(ToolState::Call),
            tool_call_id: Some(tool_call_id.into()),
            tool_name: Some(tool_name.into()),
            args: Some(args),
            ..Default::default()
        })
    }

    /// Create a tool result
    pub fn tool_result(tool_call_id: impl Into<String>, result: serde_json::Value) -> Self {
        Self::ToolResult {
            tool_call_id: Some(tool_call_id.into()),
            tool_name: None,
            result: Some(result),
        }
    }

    /// Get text if this is text content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    /// The invocation of a tool-invocation part, nested fields first
    pub fn invocation(&self) -> Option<ToolInvocation> {
        match self {
            Self::ToolInvocation {
                tool_invocation,
                inline,
            } => Some(match tool_invocation {
                Some(nested) => nested.clone().or(inline),
                None => inline.clone(),
            }),
            _ => None,
        }
    }

    /// Get the artifact if this is a code artifact
    pub fn as_code_artifact(&self) -> Option<&CodeArtifact> {
        match self {
            Self::CodeArtifact(artifact) => Some(artifact),
            _ => None,
        }
    }

    /// The join key of a tool-invocation or tool-result part
    pub fn tool_call_id(&self) -> Option<&str> {
        match self {
            Self::ToolInvocation {
                tool_invocation,
                inline,
            } => tool_invocation
                .as_ref()
                .and_then(|t| t.tool_call_id.as_deref())
                .or(inline.tool_call_id.as_deref())
                .filter(|id| !id.is_empty()),
            Self::ToolResult { tool_call_id, .. } => {
                tool_call_id.as_deref().filter(|id| !id.is_empty())
            }
            _ => None,
        }
    }

    /// The `type` discriminator as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Reasoning { .. } => "reasoning",
            Self::ToolInvocation { .. } => "tool-invocation",
            Self::ToolResult { .. } => "tool-result",
            Self::StepStart => "step-start",
            Self::CodeArtifact(_) => "code_artifact",
            Self::Unknown => "unknown",
        }
    }
}

impl From<ToolInvocation> for Part {
    fn from(invocation: ToolInvocation) -> Self {
        Self::ToolInvocation {
            tool_invocation: Some(invocation),
            inline: ToolInvocation::default(),
        }
    }
}

/// Body of a turn: opaque text for user turns, parts otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Parts(Vec<Part>),
}

impl TurnContent {
    /// The parts, or an empty slice for opaque text
    pub fn parts(&self) -> &[Part] {
        match self {
            Self::Parts(parts) => parts,
            Self::Text(_) => &[],
        }
    }
}

/// One role-tagged message as delivered by the streaming exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    /// Create a user turn with text content
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Create an assistant turn
    pub fn assistant(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Parts(parts),
        }
    }

    /// Create a tool turn carrying results
    pub fn tool(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Tool,
            content: TurnContent::Parts(parts),
        }
    }

    /// Get the content parts
    pub fn parts(&self) -> &[Part] {
        self.content.parts()
    }
}

/// The persisted assistant message produced from one exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedMessage {
    pub role: Role,
    /// Plain-text projection of the text parts
    pub content: String,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_invocation_wire_shape() {
        let part = Part::tool_call("a", "getWeather", json!({"lat": 1}));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "tool-invocation",
                "toolInvocation": {
                    "state": "call",
                    "toolCallId": "a",
                    "toolName": "getWeather",
                    "args": {"lat": 1}
                }
            })
        );
    }

    #[test]
    fn test_absent_fields_not_invented() {
        let raw = json!({"type": "tool-invocation", "toolInvocation": {"toolCallId": "x"}});
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);

        let raw = json!({"type": "reasoning", "text": "hmm"});
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn test_code_artifact_wire_shape() {
        let raw = json!({
            "type": "code_artifact",
            "documentId": "d1",
            "title": "Python Code",
            "language": "python",
            "code": "print(1)"
        });
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(part.as_code_artifact().unwrap().document_id, "d1");
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn test_step_start_and_unknown() {
        let part: Part = serde_json::from_value(json!({"type": "step-start"})).unwrap();
        assert_eq!(part, Part::StepStart);

        let part: Part =
            serde_json::from_value(json!({"type": "sources", "sources": []})).unwrap();
        assert_eq!(part, Part::Unknown);
    }

    #[test]
    fn test_turn_content_text_or_parts() {
        let turn: Turn = serde_json::from_value(json!({"role": "user", "content": "hi"})).unwrap();
        assert!(turn.parts().is_empty());

        let turn: Turn = serde_json::from_value(json!({
            "role": "tool",
            "content": [{"type": "tool-result", "toolCallId": "a", "result": 1}]
        }))
        .unwrap();
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.parts()[0].tool_call_id(), Some("a"));
    }

    #[test]
    fn test_inline_invocation_fields() {
        let raw = json!({
            "type": "tool-invocation",
            "toolCallId": "a",
            "toolName": "getWeather",
            "args": {},
            "state": "call"
        });
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(part.tool_call_id(), Some("a"));
        let call = part.invocation().unwrap();
        assert_eq!(call.name(), "getWeather");
        assert_eq!(call.state, Some(ToolState::Call));
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn test_nested_fields_win_over_inline() {
        let part: Part = serde_json::from_value(json!({
            "type": "tool-invocation",
            "toolName": "outer",
            "toolInvocation": {"toolCallId": "a", "toolName": "inner"}
        }))
        .unwrap();
        let call = part.invocation().unwrap();
        assert_eq!(call.call_id(), Some("a"));
        assert_eq!(call.name(), "inner");
    }

    #[test]
    fn test_invocation_without_payload_decodes() {
        let part: Part = serde_json::from_value(json!({"type": "tool-invocation"})).unwrap();
        assert_eq!(part.tool_call_id(), None);
        assert_eq!(part.invocation(), Some(ToolInvocation::default()));
    }

    #[test]
    fn test_null_result_round_trips() {
        let raw = json!({
            "type": "tool-invocation",
            "toolInvocation": {"toolCallId": "a", "state": "result", "result": null}
        });
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(part.invocation().unwrap().result, Some(serde_json::Value::Null));
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);

        let raw = json!({"type": "tool-result", "toolCallId": "a", "result": null});
        let part: Part = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&part).unwrap(), raw);
    }

    #[test]
    fn test_empty_call_id_is_absent() {
        let part = Part::tool_result("", json!(null));
        assert_eq!(part.tool_call_id(), None);
    }
}
