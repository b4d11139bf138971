//! Tree codec
//!
//! Recovers the project-tree JSON shape from free-form model output and
//! serializes trees back to stable pretty-printed JSON. Pure, no I/O.

use crate::types::{validate_tree, ProjectTree, SchemaCheck};

/// Extract a project tree from arbitrary text.
///
/// First tries a whole-text parse. If that fails or the shape does not
/// match, slices from the first `{` to the last `}` and retries, which
/// tolerates models that wrap the JSON in prose or code fences. Returns
/// `None` for anything that does not validate; never panics.
pub fn extract(text: &str) -> Option<ProjectTree> {
    if text.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let SchemaCheck::Valid(tree) = validate_tree(value) {
            return Some(tree);
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    let candidate = &text[start..=end];
    match serde_json::from_str::<serde_json::Value>(candidate) {
        Ok(value) => match validate_tree(value) {
            SchemaCheck::Valid(tree) => Some(tree),
            SchemaCheck::Invalid(_) => None,
        },
        Err(_) => None,
    }
}

/// Serialize a tree to stable pretty-printed JSON (2-space indentation,
/// key order as constructed). Returns `None` on failure rather than
/// panicking.
pub fn serialize(tree: &ProjectTree) -> Option<String> {
    serde_json::to_string_pretty(tree).ok()
}
