//! Result types for pipeline output.

use serde::{Deserialize, Serialize};

/// Output of one pipeline run.
///
/// `lines` holds one transformed line per retained text fragment, in
/// document order. `matched` counts every node the query selected, including
/// nodes whose text was empty after trimming, so callers can tell "the query
/// matched nothing" apart from "the query matched only blank nodes".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// Transformed lines, one per retained fragment.
    pub lines: Vec<String>,

    /// Number of nodes selected by the query before blank fragments were dropped.
    pub matched: usize,
}

impl Extraction {
    /// Number of retained lines (the reported occurrence count).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when no line was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of selected nodes that produced a blank fragment.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.matched.saturating_sub(self.lines.len())
    }

    /// Iterates over the lines in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }
}

impl<'a> IntoIterator for &'a Extraction {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
