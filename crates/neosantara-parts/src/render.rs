//! Projections over stored parts for display and sharing

use crate::types::{CodeArtifact, Part};

/// Parts to display for a message.
///
/// With tools hidden only text, reasoning and code artifacts are shown.
pub fn visible_parts(parts: &[Part], show_tools: bool) -> Vec<&Part> {
    parts
        .iter()
        .filter(|part| {
            show_tools
                || matches!(
                    part,
                    Part::Text { .. } | Part::Reasoning { .. } | Part::CodeArtifact(_)
                )
        })
        .collect()
}

/// First code artifact in a message, as served by the share endpoint
pub fn find_code_artifact(parts: &[Part]) -> Option<&CodeArtifact> {
    parts.iter().find_map(Part::as_code_artifact)
}
