//! Storage trait for chat data

use async_trait::async_trait;

use crate::error::Result;
use crate::records::{
    CodeSnippet, MessageRow, NewCodeSnippet, NewMessage, PublicChat, SharedMessage,
};

/// Relational store holding chats, messages and snippets.
///
/// Every method is a single round trip; nothing here retries.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert one message row and return it as stored
    async fn insert_message(&self, message: &NewMessage) -> Result<MessageRow>;

    /// Fetch a message with the `public` flag of its chat
    async fn message_with_chat(&self, message_id: i64) -> Result<Option<SharedMessage>>;

    /// Mark a chat owned by `user_id` as public
    async fn publish_chat(&self, chat_id: &str, user_id: &str) -> Result<()>;

    /// Public chats, newest first
    async fn public_chats(&self) -> Result<Vec<PublicChat>>;

    /// Insert a snippet and return its id
    async fn insert_snippet(&self, snippet: &NewCodeSnippet) -> Result<String>;

    /// Fetch a snippet by id
    async fn snippet(&self, snippet_id: &str) -> Result<Option<CodeSnippet>>;
}
