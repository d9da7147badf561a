//! Row types for the `messages`, `chats` and `code_snippets` tables

use chrono::{DateTime, Utc};
use neosantara_parts::{FinalizedMessage, Part, Role};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Title shown for chats that were never named
pub const UNTITLED_CHAT: &str = "Untitled Chat";

/// Row written for a new message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub chat_id: String,
    pub role: Role,
    pub content: String,
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl NewMessage {
    /// Attach a finalized assistant message to its chat
    pub fn from_finalized(chat_id: impl Into<String>, message: FinalizedMessage) -> Self {
        Self {
            chat_id: chat_id.into(),
            role: message.role,
            content: message.content,
            parts: message.parts,
            message_group_id: message.message_group_id,
            model: message.model,
        }
    }
}

/// A stored message.
///
/// `parts` is kept as raw JSON so reading a row never rewrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub chat_id: String,
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parts: Option<serde_json::Value>,
    #[serde(default)]
    pub message_group_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MessageRow {
    /// Decode the stored parts; a row without parts has none
    pub fn parts(&self) -> Result<Vec<Part>> {
        match &self.parts {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
            _ => Ok(Vec::new()),
        }
    }
}

/// A message together with the visibility of its chat
#[derive(Debug, Clone, PartialEq)]
pub struct SharedMessage {
    pub message: MessageRow,
    pub chat_public: bool,
}

/// A chat owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub public: bool,
    pub created_at: DateTime<Utc>,
}

/// Public profile of a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publisher {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub profile_image: Option<String>,
}

/// Entry in the public chat listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChat {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub model: Option<String>,
    pub publisher: Publisher,
}

/// Input for a new code snippet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetDraft {
    pub code_content: String,
    pub language: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Row written for a new code snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCodeSnippet {
    pub code_content: String,
    pub language: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub chat_id: Option<String>,
    pub user_id: String,
    pub is_public: bool,
}

/// A stored code snippet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: String,
    pub code_content: String,
    pub language: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chat_id: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
