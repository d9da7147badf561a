//! Fenced code block extraction from assistant text

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::types::{CodeArtifact, Part};

/// An opening fence with a language tag, the body, and the next closing fence.
static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```([A-Za-z0-9_+#.\-]+)[ \t]*\r?\n((?s:.*?))```").unwrap()
});

/// Namespace for derived document ids
const DOCUMENT_NAMESPACE: Uuid = Uuid::from_u128(0x6e65_6f73_616e_7461_7261_2d63_6f64_6531);

/// How code artifacts get their `documentId`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentIds {
    /// Fresh random UUID per artifact
    #[default]
    Random,
    /// UUID v5 over language, code and ordinal; stable across runs
    Derived,
}

impl DocumentIds {
    fn generate(&self, language: &str, code: &str, ordinal: usize) -> String {
        match self {
            DocumentIds::Random => Uuid::new_v4().to_string(),
            DocumentIds::Derived => {
                let key = format!("{ordinal}\u{0}{language}\u{0}{code}");
                Uuid::new_v5(&DOCUMENT_NAMESPACE, key.as_bytes()).to_string()
            }
        }
    }
}

/// Title shown for an artifact, e.g. `python` -> `Python Code`
pub fn title_for_language(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => format!("{}{} Code", first.to_uppercase(), chars.as_str()),
        None => "Code".to_string(),
    }
}

/// Split one text into text and code-artifact parts, left to right.
///
/// `ordinal` counts artifacts already produced for the current message and is
/// advanced for each one emitted here. Text without a fence comes back as a
/// single text part, even when empty.
pub fn split_code_fences(text: &str, ids: DocumentIds, ordinal: &mut usize) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut cursor = 0;

    for caps in CODE_FENCE.captures_iter(text) {
        let (Some(whole), Some(lang), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let before = &text[cursor..whole.start()];
        if !before.is_empty() {
            parts.push(Part::text(before));
        }

        let language = lang.as_str().to_string();
        let code = body.as_str().trim().to_string();
        let document_id = ids.generate(&language, &code, *ordinal);
        *ordinal += 1;

        parts.push(Part::CodeArtifact(CodeArtifact {
            document_id,
            title: title_for_language(&language),
            language,
            code,
        }));
        cursor = whole.end();
    }

    if cursor == 0 {
        return vec![Part::text(text)];
    }

    let after = &text[cursor..];
    if !after.is_empty() {
        parts.push(Part::text(after));
    }
    parts
}
