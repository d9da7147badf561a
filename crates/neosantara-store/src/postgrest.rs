//! Hosted Postgres store reached through its REST (PostgREST) interface

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::records::{
    CodeSnippet, MessageRow, NewCodeSnippet, NewMessage, PublicChat, Publisher, SharedMessage,
    UNTITLED_CHAT,
};
use crate::store::ChatStore;

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatVisibility {
    #[serde(default)]
    public: bool,
}

#[derive(Debug, Deserialize)]
struct MessageWithChat {
    #[serde(flatten)]
    message: MessageRow,
    #[serde(default)]
    chats: Option<ChatVisibility>,
}

#[derive(Debug, Deserialize)]
struct ChatListingRow {
    id: String,
    #[serde(default)]
    title: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    users: Option<Publisher>,
}

impl From<ChatListingRow> for PublicChat {
    fn from(row: ChatListingRow) -> Self {
        Self {
            id: row.id,
            title: row
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNTITLED_CHAT.to_string()),
            created_at: row.created_at,
            model: row.model,
            publisher: row.users.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: serde_json::Value,
}

/// Store client for a hosted Postgres project
pub struct PostgrestStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl PostgrestStore {
    /// Create a client for the project at `base_url` using its API key
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Act as a signed-in user so row level security applies to them
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = self.table_url(table);
        tracing::debug!(%method, %url, "postgrest request");
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.access_token.as_deref().unwrap_or(&self.api_key))
            .header("accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(storage_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn first<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T> {
        let rows: Vec<T> = Self::send(request).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| Error::storage(None, format!("{what} returned no rows")))
    }
}

fn storage_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<PostgrestError>(body) {
        Ok(err) => {
            tracing::debug!(
                status,
                code = err.code.as_deref(),
                details = err.details.as_deref(),
                hint = err.hint.as_deref(),
                "postgrest error"
            );
            Error::storage(Some(status), err.message)
        }
        Err(_) if body.trim().is_empty() => Error::storage(Some(status), format!("HTTP {status}")),
        Err(_) => Error::storage(Some(status), body.trim().to_string()),
    }
}

fn id_to_string(id: serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[async_trait]
impl ChatStore for PostgrestStore {
    async fn insert_message(&self, message: &NewMessage) -> Result<MessageRow> {
        let request = self
            .request(Method::POST, "messages")
            .header("Prefer", "return=representation")
            .json(message);
        Self::first(request, "insert into messages").await
    }

    async fn message_with_chat(&self, message_id: i64) -> Result<Option<SharedMessage>> {
        let request = self.request(Method::GET, "messages").query(&[
            ("select", "*,chats(public)".to_string()),
            ("id", format!("eq.{message_id}")),
        ]);
        let rows: Vec<MessageWithChat> = Self::send(request).await?;
        Ok(rows.into_iter().next().map(|row| SharedMessage {
            chat_public: row.chats.is_some_and(|c| c.public),
            message: row.message,
        }))
    }

    async fn publish_chat(&self, chat_id: &str, user_id: &str) -> Result<()> {
        let request = self
            .request(Method::PATCH, "chats")
            .query(&[
                ("id", format!("eq.{chat_id}")),
                ("user_id", format!("eq.{user_id}")),
                ("select", "id".to_string()),
            ])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "public": true }));
        let rows: Vec<IdRow> = Self::send(request).await?;
        if rows.is_empty() {
            return Err(Error::NotFound(format!("chat {chat_id}")));
        }
        Ok(())
    }

    async fn public_chats(&self) -> Result<Vec<PublicChat>> {
        let request = self.request(Method::GET, "chats").query(&[
            (
                "select",
                "id,title,created_at,model,users(id,display_name,profile_image)",
            ),
            ("public", "eq.true"),
            ("order", "created_at.desc"),
        ]);
        let rows: Vec<ChatListingRow> = Self::send(request).await?;
        Ok(rows.into_iter().map(PublicChat::from).collect())
    }

    async fn insert_snippet(&self, snippet: &NewCodeSnippet) -> Result<String> {
        let request = self
            .request(Method::POST, "code_snippets")
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(snippet);
        let row: IdRow = Self::first(request, "insert into code_snippets").await?;
        Ok(id_to_string(row.id))
    }

    async fn snippet(&self, snippet_id: &str) -> Result<Option<CodeSnippet>> {
        let request = self
            .request(Method::GET, "code_snippets")
            .query(&[("select", "*".to_string()), ("id", format!("eq.{snippet_id}"))]);
        let rows: Vec<CodeSnippet> = Self::send(request).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neosantara_parts::{Part, Role};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_table_url_trims_slash() {
        let store = PostgrestStore::new("https://abc.supabase.co/", "key");
        assert_eq!(
            store.table_url("messages"),
            "https://abc.supabase.co/rest/v1/messages"
        );
    }

    #[test]
    fn test_storage_error_from_body() {
        let body = r#"{"code":"23503","details":null,"hint":null,"message":"violates foreign key constraint"}"#;
        match storage_error(409, body) {
            Error::Storage { status, message } => {
                assert_eq!(status, Some(409));
                assert_eq!(message, "violates foreign key constraint");
            }
            other => panic!("expected Storage, got {:?}", other),
        }
    }

    #[test]
    fn test_storage_error_plain_body() {
        assert_eq!(
            storage_error(502, "").to_string(),
            "Storage error: HTTP 502"
        );
        assert_eq!(
            storage_error(500, "upstream down\n").to_string(),
            "Storage error: upstream down"
        );
    }

    #[test]
    fn test_message_with_chat_row() {
        let row: MessageWithChat = serde_json::from_value(json!({
            "id": 12,
            "chat_id": "c",
            "role": "assistant",
            "content": "x",
            "parts": [],
            "chats": {"public": true}
        }))
        .unwrap();
        assert_eq!(row.message.id, 12);
        assert!(row.chats.unwrap().public);
    }

    #[test]
    fn test_listing_row_defaults() {
        let row: ChatListingRow = serde_json::from_value(json!({
            "id": "c",
            "title": null,
            "created_at": "2025-06-01T10:00:00.123+00:00",
            "model": "gpt-4.1",
            "users": null
        }))
        .unwrap();
        let chat = PublicChat::from(row);
        assert_eq!(chat.title, UNTITLED_CHAT);
        assert_eq!(chat.publisher, Publisher::default());
    }

    #[test]
    fn test_id_to_string() {
        assert_eq!(id_to_string(json!("a-b")), "a-b");
        assert_eq!(id_to_string(json!(42)), "42");
    }

    fn message_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "chat_id": "c1",
            "role": "assistant",
            "content": "hi",
            "parts": [{"type": "text", "text": "hi"}],
            "created_at": "2025-06-01T10:00:00+00:00"
        })
    }

    #[tokio::test]
    async fn test_insert_message_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/messages"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer user-token"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({
                "chat_id": "c1",
                "role": "assistant",
                "content": "hi",
                "parts": [{"type": "text", "text": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([message_json(7)])))
            .expect(1)
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon").with_access_token("user-token");
        let row = store
            .insert_message(&NewMessage {
                chat_id: "c1".into(),
                role: Role::Assistant,
                content: "hi".into(),
                parts: vec![Part::text("hi")],
                message_group_id: None,
                model: None,
            })
            .await
            .unwrap();
        assert_eq!(row.id, 7);
        assert_eq!(row.parts().unwrap(), vec![Part::text("hi")]);
    }

    #[tokio::test]
    async fn test_insert_without_rows_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/messages"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        let err = store
            .insert_message(&NewMessage {
                chat_id: "c1".into(),
                role: Role::Assistant,
                content: "hi".into(),
                parts: Vec::new(),
                message_group_id: None,
                model: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage { status: None, .. }));
    }

    #[tokio::test]
    async fn test_message_with_chat_query() {
        let server = MockServer::start().await;
        let mut row = message_json(12);
        row["chats"] = json!({"public": true});
        Mock::given(method("GET"))
            .and(path("/rest/v1/messages"))
            .and(header("authorization", "Bearer anon"))
            .and(query_param("select", "*,chats(public)"))
            .and(query_param("id", "eq.12"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/messages"))
            .and(query_param("id", "eq.13"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        let shared = store.message_with_chat(12).await.unwrap().unwrap();
        assert!(shared.chat_public);
        assert_eq!(shared.message.id, 12);
        assert!(store.message_with_chat(13).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_publish_chat_filters_by_owner() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/chats"))
            .and(query_param("id", "eq.c1"))
            .and(query_param("user_id", "eq.u1"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({"public": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "c1"}])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/chats"))
            .and(query_param("user_id", "eq.u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        store.publish_chat("c1", "u1").await.unwrap();
        assert!(store.publish_chat("c1", "u2").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_public_chats_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/chats"))
            .and(query_param("public", "eq.true"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": "c2",
                    "title": "Sorting",
                    "created_at": "2025-06-02T10:00:00+00:00",
                    "model": null,
                    "users": {"id": "u1", "display_name": "Sari", "profile_image": null}
                },
                {
                    "id": "c1",
                    "title": "",
                    "created_at": "2025-06-01T10:00:00+00:00",
                    "model": "gpt-4.1",
                    "users": null
                }
            ])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        let chats = store.public_chats().await.unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].title, "Sorting");
        assert_eq!(chats[0].publisher.display_name.as_deref(), Some("Sari"));
        assert_eq!(chats[1].title, UNTITLED_CHAT);
    }

    #[tokio::test]
    async fn test_error_body_becomes_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/code_snippets"))
            .and(query_param("select", "id"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "code": "42501",
                "details": null,
                "hint": null,
                "message": "new row violates row-level security policy"
            })))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        let err = store
            .insert_snippet(&NewCodeSnippet {
                code_content: "ls".into(),
                language: "sh".into(),
                title: None,
                description: None,
                chat_id: None,
                user_id: "u1".into(),
                is_public: false,
            })
            .await
            .unwrap_err();
        match err {
            Error::Storage { status, message } => {
                assert_eq!(status, Some(403));
                assert_eq!(message, "new row violates row-level security policy");
            }
            other => panic!("expected Storage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_snippet_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/code_snippets"))
            .and(query_param("id", "eq.s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "s1",
                "code_content": "ls",
                "language": "sh",
                "user_id": "u1",
                "is_public": true
            }])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/code_snippets"))
            .and(query_param("id", "eq.missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = PostgrestStore::new(server.uri(), "anon");
        let snippet = store.snippet("s1").await.unwrap().unwrap();
        assert_eq!(snippet.language, "sh");
        assert!(snippet.is_public);
        assert!(store.snippet("missing").await.unwrap().is_none());
    }
}
