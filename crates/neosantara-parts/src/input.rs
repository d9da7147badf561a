//! Decoding exchange turns from JSON

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Turn;

#[derive(Deserialize)]
#[serde(untagged)]
enum TurnsDocument {
    List(Vec<Turn>),
    Wrapped { messages: Vec<Turn> },
}

/// Parse the turns of one exchange.
///
/// Accepts either a bare array of turns or an object with a `messages` array,
/// which is how the chat route receives them.
pub fn parse_turns(input: &str) -> Result<Vec<Turn>> {
    let value: serde_json::Value = serde_json::from_str(input)?;
    if !value.is_array() && value.get("messages").is_none() {
        return Err(Error::InvalidTurns(
            "expected an array of turns or an object with `messages`".to_string(),
        ));
    }

    match serde_json::from_value(value)? {
        TurnsDocument::List(turns) | TurnsDocument::Wrapped { messages: turns } => Ok(turns),
    }
}
