//! The extraction pipeline: normalize, select, extract, transform.
//!
//! Each stage runs to completion before the next starts. The first error
//! ends the run; nothing is retried.

use crate::dom::Document;
use crate::error::Result;
use crate::result::Extraction;
use crate::text;
use crate::transform::{self, TransformRule};
use crate::xpath::Query;

/// Runs the four stages over `html`.
pub(crate) fn run(html: &str, query: &Query, rule: Option<&TransformRule>) -> Result<Extraction> {
    let document = Document::parse(html);

    let selection = query.select(&document)?;
    tracing::debug!(query = query.as_str(), matched = selection.len(), "selected nodes");

    let fragments = text::fragments(&document, &selection);
    if fragments.len() < selection.len() {
        tracing::debug!(
            dropped = selection.len() - fragments.len(),
            "dropped blank fragments"
        );
    }

    let lines = transform::transform(fragments, rule);
    if let Some(rule) = rule {
        tracing::debug!(pattern = rule.pattern(), lines = lines.len(), "transformed fragments");
    }

    Ok(Extraction {
        lines,
        matched: selection.len(),
    })
}
