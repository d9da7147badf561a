//! Public sharing of chats and code artifacts

use neosantara_parts::{CodeArtifact, find_code_artifact};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::records::MessageRow;
use crate::store::ChatStore;

/// A code artifact served read-only from a public chat
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedArtifact {
    pub message_id: i64,
    pub chat_id: String,
    #[serde(flatten)]
    pub artifact: CodeArtifact,
}

/// Fetch a message for public display.
///
/// Missing messages are [`Error::NotFound`]; messages of private chats are
/// [`Error::NotPublic`].
pub async fn shared_message(store: &dyn ChatStore, message_id: i64) -> Result<MessageRow> {
    let shared = store
        .message_with_chat(message_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("message {message_id}")))?;

    if !shared.chat_public {
        tracing::debug!(message_id, "refusing to share message of private chat");
        return Err(Error::NotPublic);
    }
    Ok(shared.message)
}

/// Fetch the code artifact of a message in a public chat
pub async fn shared_artifact(store: &dyn ChatStore, message_id: i64) -> Result<SharedArtifact> {
    let message = shared_message(store, message_id).await?;
    let parts = message.parts()?;
    let artifact = find_code_artifact(&parts)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("artifact in message {message_id}")))?;

    Ok(SharedArtifact {
        message_id: message.id,
        chat_id: message.chat_id,
        artifact,
    })
}

/// Make a chat public on behalf of its owner
pub async fn publish_chat(store: &dyn ChatStore, chat_id: &str, user_id: Option<&str>) -> Result<()> {
    if chat_id.is_empty() {
        return Err(Error::InvalidInput("chatId is required".to_string()));
    }
    let user_id = user_id.filter(|u| !u.is_empty()).ok_or(Error::Unauthorized)?;

    store.publish_chat(chat_id, user_id).await?;
    tracing::info!(chat_id, "chat published");
    Ok(())
}
