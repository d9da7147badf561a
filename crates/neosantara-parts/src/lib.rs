//! neosantara-parts: Assistant message parts and their reconciliation
//!
//! This crate defines the tagged part model shared by the chat frontend and
//! storage, and the reconciler that turns the turns of one streamed exchange
//! into a single ordered, deduplicated assistant record.

pub mod error;
pub mod fence;
pub mod input;
pub mod reconcile;
pub mod render;
pub mod types;

pub use error::{Error, Result};
pub use fence::DocumentIds;
pub use input::parse_turns;
pub use reconcile::{
    Anomaly, PLACEHOLDER_CONTENT, ReconcileOptions, Reconciler, Reconciliation, reconcile,
};
pub use render::{find_code_artifact, visible_parts};
pub use types::*;
