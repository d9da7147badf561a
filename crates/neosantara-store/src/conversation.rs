//! Visible message timeline for one chat

use neosantara_parts::{Part, Role, Turn};

use crate::error::Result;
use crate::persist::save_final_assistant_message;
use crate::records::MessageRow;
use crate::store::ChatStore;

/// Notification shown when an exchange could not be saved
pub const SEND_FAILED: &str = "Failed to send message";

/// A message as shown in the chat
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleMessage {
    /// Stored id, or an `optimistic-` id until confirmed
    pub id: String,
    pub role: Role,
    pub content: String,
    pub parts: Vec<Part>,
    /// Shown before the exchange was saved
    pub pending: bool,
}

/// Messages of one chat, with optimistic sends and rollback
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// Chat the messages belong to
    pub chat_id: String,
    /// Messages in display order
    pub messages: Vec<VisibleMessage>,
    /// Last error to surface to the user
    pub error: Option<String>,
}

impl Conversation {
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            ..Default::default()
        }
    }

    /// Show a user message before the exchange completes; returns its id
    pub fn push_optimistic(&mut self, text: impl Into<String>) -> String {
        let id = format!("optimistic-{}", uuid::Uuid::new_v4());
        self.messages.push(VisibleMessage {
            id: id.clone(),
            role: Role::User,
            content: text.into(),
            parts: Vec::new(),
            pending: true,
        });
        id
    }

    /// Remove an optimistic message and record the error to display
    pub fn rollback(&mut self, optimistic_id: &str, error: impl Into<String>) {
        self.messages.retain(|m| m.id != optimistic_id);
        self.error = Some(error.into());
    }

    /// Take the pending error notification, if any
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }

    /// Persist the assistant message of a finished exchange.
    ///
    /// On success the optimistic message is confirmed and the stored assistant
    /// message appended. On failure the optimistic message is rolled back, the
    /// error recorded, and the error returned.
    pub async fn finalize_exchange(
        &mut self,
        store: &dyn ChatStore,
        optimistic_id: &str,
        turns: &[Turn],
        message_group_id: Option<String>,
        model: Option<String>,
    ) -> Result<MessageRow> {
        let saved = match save_final_assistant_message(
            store,
            &self.chat_id,
            turns,
            message_group_id,
            model,
        )
        .await
        {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!(chat_id = %self.chat_id, optimistic_id, "rolling back optimistic message");
                self.rollback(optimistic_id, SEND_FAILED);
                return Err(e);
            }
        };

        if let Some(message) = self.messages.iter_mut().find(|m| m.id == optimistic_id) {
            message.pending = false;
        }
        self.messages.push(VisibleMessage {
            id: saved.id.to_string(),
            role: Role::Assistant,
            content: saved.content.clone().unwrap_or_default(),
            parts: saved.parts()?,
            pending: false,
        });
        Ok(saved)
    }
}
