//! Saved code snippets

use crate::error::{Error, Result};
use crate::records::{CodeSnippet, NewCodeSnippet, SnippetDraft};
use crate::store::ChatStore;

/// Save a snippet for the signed-in user and return its id
pub async fn save_snippet(
    store: &dyn ChatStore,
    user_id: Option<&str>,
    draft: SnippetDraft,
) -> Result<String> {
    let user_id = user_id.filter(|u| !u.is_empty()).ok_or(Error::Unauthorized)?;
    if draft.code_content.is_empty() || draft.language.is_empty() {
        return Err(Error::InvalidInput(
            "Code content and language are required.".to_string(),
        ));
    }

    let snippet = NewCodeSnippet {
        code_content: draft.code_content,
        language: draft.language,
        title: draft.title,
        description: draft.description,
        chat_id: draft.chat_id.filter(|c| !c.is_empty()),
        user_id: user_id.to_string(),
        is_public: draft.is_public,
    };
    store.insert_snippet(&snippet).await
}

/// Fetch a snippet visible to `viewer`.
///
/// Public snippets are visible to anyone; private ones only to their owner.
/// A hidden snippet is reported as missing.
pub async fn fetch_snippet(
    store: &dyn ChatStore,
    snippet_id: &str,
    viewer: Option<&str>,
) -> Result<CodeSnippet> {
    if snippet_id.is_empty() {
        return Err(Error::InvalidInput("Snippet ID is required.".to_string()));
    }

    match store.snippet(snippet_id).await? {
        Some(s) if s.is_public || viewer == Some(s.user_id.as_str()) => Ok(s),
        _ => Err(Error::NotFound(format!("code snippet {snippet_id}"))),
    }
}
