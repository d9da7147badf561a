//! neosantara-store: Persistence and sharing for chat messages
//!
//! This crate stores the reconciled assistant message of each exchange and
//! serves chats, code artifacts and snippets that their owners made public.

pub mod conversation;
pub mod error;
pub mod memory;
pub mod persist;
pub mod postgrest;
pub mod records;
pub mod share;
pub mod snippets;
pub mod store;

pub use conversation::{Conversation, VisibleMessage};
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use persist::{save_final_assistant_message, save_reconciled};
pub use postgrest::PostgrestStore;
pub use records::*;
pub use share::{SharedArtifact, publish_chat, shared_artifact, shared_message};
pub use snippets::{fetch_snippet, save_snippet};
pub use store::ChatStore;
