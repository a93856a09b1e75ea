//! Rendering of aggregated instruction documents into a Continue rule file.

use crate::constants::{BLOCK_SEPARATOR, RULE_DESCRIPTION, RULE_NAME};
use crate::sources::SourceDocument;

/// Joins labeled blocks of every document in the given order.
///
/// Documents without content contribute an empty block body.
pub fn aggregate_body(documents: &[SourceDocument]) -> String {
    documents
        .iter()
        .map(|doc| format!("# {}\n\n{}", doc.label, doc.content.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Renders the full rule file: front matter followed by the aggregated body.
///
/// Content is embedded verbatim.
pub fn render(documents: &[SourceDocument]) -> String {
    format!(
        "---\nname: {}\nalwaysApply: true\ndescription: {}\n---\n\n{}\n",
        RULE_NAME,
        RULE_DESCRIPTION,
        aggregate_body(documents)
    )
}
