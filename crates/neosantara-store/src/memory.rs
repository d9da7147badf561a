//! In-process store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::records::{
    ChatRecord, CodeSnippet, MessageRow, NewCodeSnippet, NewMessage, PublicChat, Publisher,
    SharedMessage, UNTITLED_CHAT,
};
use crate::store::ChatStore;

#[derive(Default)]
struct Tables {
    chats: HashMap<String, ChatRecord>,
    users: HashMap<String, Publisher>,
    messages: Vec<MessageRow>,
    snippets: Vec<CodeSnippet>,
    next_message_id: i64,
    failing_writes: Option<String>,
}

/// Store backed by process memory.
///
/// Enforces the same ownership rules as the hosted tables; writes can be made
/// to fail on demand to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a chat
    pub fn add_chat(&self, chat: ChatRecord) {
        self.tables.write().chats.insert(chat.id.clone(), chat);
    }

    /// Add or replace a user profile
    pub fn add_user(&self, user_id: impl Into<String>, profile: Publisher) {
        self.tables.write().users.insert(user_id.into(), profile);
    }

    /// Make every subsequent write fail with `message`, or succeed again with `None`
    pub fn fail_writes(&self, message: Option<&str>) {
        self.tables.write().failing_writes = message.map(str::to_string);
    }

    /// Snapshot of all stored messages
    pub fn messages(&self) -> Vec<MessageRow> {
        self.tables.read().messages.clone()
    }

    /// Look up a chat
    pub fn chat(&self, chat_id: &str) -> Option<ChatRecord> {
        self.tables.read().chats.get(chat_id).cloned()
    }

    fn check_writable(tables: &Tables) -> Result<()> {
        match &tables.failing_writes {
            Some(message) => Err(Error::storage(Some(503), message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_message(&self, message: &NewMessage) -> Result<MessageRow> {
        let mut tables = self.tables.write();
        Self::check_writable(&tables)?;

        if !tables.chats.contains_key(&message.chat_id) {
            return Err(Error::storage(
                Some(409),
                format!(
                    "insert or update on table \"messages\" violates foreign key constraint (chat_id {})",
                    message.chat_id
                ),
            ));
        }

        tables.next_message_id += 1;
        let row = MessageRow {
            id: tables.next_message_id,
            chat_id: message.chat_id.clone(),
            role: message.role,
            content: Some(message.content.clone()),
            parts: Some(serde_json::to_value(&message.parts)?),
            message_group_id: message.message_group_id.clone(),
            model: message.model.clone(),
            created_at: Some(Utc::now()),
        };
        tables.messages.push(row.clone());
        Ok(row)
    }

    async fn message_with_chat(&self, message_id: i64) -> Result<Option<SharedMessage>> {
        let tables = self.tables.read();
        Ok(tables
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|message| SharedMessage {
                chat_public: tables
                    .chats
                    .get(&message.chat_id)
                    .is_some_and(|chat| chat.public),
                message: message.clone(),
            }))
    }

    async fn publish_chat(&self, chat_id: &str, user_id: &str) -> Result<()> {
        let mut tables = self.tables.write();
        Self::check_writable(&tables)?;

        match tables.chats.get_mut(chat_id) {
            Some(chat) if chat.user_id == user_id => {
                chat.public = true;
                Ok(())
            }
            _ => Err(Error::NotFound(format!("chat {chat_id}"))),
        }
    }

    async fn public_chats(&self) -> Result<Vec<PublicChat>> {
        let tables = self.tables.read();
        let mut chats: Vec<PublicChat> = tables
            .chats
            .values()
            .filter(|chat| chat.public)
            .map(|chat| PublicChat {
                id: chat.id.clone(),
                title: chat
                    .title
                    .clone()
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| UNTITLED_CHAT.to_string()),
                created_at: chat.created_at,
                model: chat.model.clone(),
                publisher: tables.users.get(&chat.user_id).cloned().unwrap_or_default(),
            })
            .collect();
        chats.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(chats)
    }

    async fn insert_snippet(&self, snippet: &NewCodeSnippet) -> Result<String> {
        let mut tables = self.tables.write();
        Self::check_writable(&tables)?;

        let id = uuid::Uuid::new_v4().to_string();
        tables.snippets.push(CodeSnippet {
            id: id.clone(),
            code_content: snippet.code_content.clone(),
            language: snippet.language.clone(),
            title: snippet.title.clone(),
            description: snippet.description.clone(),
            chat_id: snippet.chat_id.clone(),
            user_id: snippet.user_id.clone(),
            is_public: snippet.is_public,
            created_at: Some(Utc::now()),
        });
        Ok(id)
    }

    async fn snippet(&self, snippet_id: &str) -> Result<Option<CodeSnippet>> {
        Ok(self
            .tables
            .read()
            .snippets
            .iter()
            .find(|s| s.id == snippet_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use neosantara_parts::{Part, Role};

    fn chat(id: &str, user: &str, public: bool, day: u32) -> ChatRecord {
        ChatRecord {
            id: id.to_string(),
            user_id: user.to_string(),
            title: None,
            model: Some("gpt-4.1".into()),
            public,
            created_at: Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap(),
        }
    }

    fn message(chat_id: &str) -> NewMessage {
        NewMessage {
            chat_id: chat_id.to_string(),
            role: Role::Assistant,
            content: "hello".into(),
            parts: vec![Part::text("hello")],
            message_group_id: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryStore::new();
        store.add_chat(chat("c1", "u1", false, 1));

        let first = store.insert_message(&message("c1")).await.unwrap();
        let second = store.insert_message(&message("c1")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.parts().unwrap(), vec![Part::text("hello")]);
        assert_eq!(store.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_requires_chat() {
        let store = MemoryStore::new();
        let err = store.insert_message(&message("missing")).await.unwrap_err();
        assert!(matches!(err, Error::Storage { status: Some(409), .. }));
    }

    #[tokio::test]
    async fn test_failing_writes() {
        let store = MemoryStore::new();
        store.add_chat(chat("c1", "u1", false, 1));
        store.fail_writes(Some("connection reset"));
        assert!(store.insert_message(&message("c1")).await.is_err());
        assert!(store.messages().is_empty());

        store.fail_writes(None);
        assert!(store.insert_message(&message("c1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_publish_requires_owner() {
        let store = MemoryStore::new();
        store.add_chat(chat("c1", "u1", false, 1));

        assert!(store.publish_chat("c1", "u2").await.unwrap_err().is_not_found());
        assert!(!store.chat("c1").unwrap().public);

        store.publish_chat("c1", "u1").await.unwrap();
        assert!(store.chat("c1").unwrap().public);
    }

    #[tokio::test]
    async fn test_public_chats_newest_first() {
        let store = MemoryStore::new();
        store.add_chat(chat("old", "u1", true, 1));
        store.add_chat(chat("new", "u1", true, 3));
        store.add_chat(chat("private", "u1", false, 2));
        store.add_user(
            "u1",
            Publisher {
                id: Some("u1".into()),
                display_name: Some("Sari".into()),
                profile_image: None,
            },
        );

        let chats = store.public_chats().await.unwrap();
        let ids: Vec<_> = chats.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["new", "old"]);
        assert_eq!(chats[0].title, UNTITLED_CHAT);
        assert_eq!(chats[0].publisher.display_name.as_deref(), Some("Sari"));
        assert!(chats[0].created_at - chats[1].created_at == Duration::days(2));
    }

    #[tokio::test]
    async fn test_message_with_chat_visibility() {
        let store = MemoryStore::new();
        store.add_chat(chat("c1", "u1", true, 1));
        let row = store.insert_message(&message("c1")).await.unwrap();

        let shared = store.message_with_chat(row.id).await.unwrap().unwrap();
        assert!(shared.chat_public);
        assert!(store.message_with_chat(999).await.unwrap().is_none());
    }
}
