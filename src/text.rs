//! Text Extractor
//!
//! Turns selected nodes into trimmed text fragments. Attribute, text and
//! comment nodes contribute their own value; elements contribute their full
//! inner text. Fragments that end up blank are dropped.

use crate::dom::{Document, NodeId};

/// Characters stripped from both ends of every fragment.
pub const TRIM_CHARS: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\u{8}'];

/// Strips [`TRIM_CHARS`] from both ends of `text`.
///
/// ```rust
/// use rs_pull::text::trim_fragment;
///
/// assert_eq!(trim_fragment("\0\t price: 5 \r\n"), "price: 5");
/// // Non-breaking spaces are content, not padding.
/// assert_eq!(trim_fragment("\u{a0}x "), "\u{a0}x");
/// ```
#[inline]
#[must_use]
pub fn trim_fragment(text: &str) -> &str {
    text.trim_matches(&TRIM_CHARS[..])
}

/// Fragment for one node, or `None` when it is blank after trimming.
#[must_use]
pub fn fragment(doc: &Document, node: NodeId) -> Option<String> {
    let value = doc.string_value(node);
    let trimmed = trim_fragment(&value);
    if trimmed.chars().all(char::is_whitespace) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Fragments for a selection, in selection order, blanks dropped.
#[must_use]
pub fn fragments(doc: &Document, selection: &[NodeId]) -> Vec<String> {
    selection
        .iter()
        .filter_map(|&node| fragment(doc, node))
        .collect()
}
