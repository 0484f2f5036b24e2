//! # rs-pull
//!
//! Pull text out of web pages: fetch a page, parse its HTML into a
//! well-formed tree no matter how broken the markup is, select nodes with
//! XPath, and optionally rewrite each extracted line with a regular
//! expression.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_pull::{pull, Options};
//!
//! let html = r#"<ul><li>Apples: 3<li>Pears: 0<li>  </ul>"#;
//!
//! let options = Options::new("//li").with_rule(r"^(\w+): (\d+)$", "$2 $1");
//! let result = pull(html, &options)?;
//! assert_eq!(result.lines, ["3 Apples", "0 Pears"]);
//! assert_eq!(result.matched, 3);
//! # Ok::<(), rs_pull::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. [`dom`]: lenient HTML parsing into a [`dom::Document`]
//! 2. [`xpath`]: node selection in document order
//! 3. [`text`]: trimmed text per node, blank fragments dropped
//! 4. [`transform`]: case-insensitive, multi-line, replace-all regex
//!
//! A query that matches nothing is not an error; the returned
//! [`Extraction`] is simply empty.

mod error;
mod extract;
mod options;
mod result;

/// HTML normalization into an arena tree.
pub mod dom;

/// XPath parsing and evaluation.
pub mod xpath;

/// Text fragment extraction and trimming.
pub mod text;

/// Regex-based fragment rewriting.
pub mod transform;

/// Character encoding detection and decoding.
pub mod encoding;

/// Page retrieval over HTTP.
pub mod fetch;

/// Console rendering of results.
#[cfg(feature = "cli")]
pub mod present;

/// Command-line argument handling for the `pull` binary.
#[cfg(feature = "cli")]
pub mod cli;

// Public API - re-exports
pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher, Page};
pub use options::{FetchOptions, Options};
pub use result::Extraction;
pub use transform::TransformRule;
pub use xpath::Query;

fn compile(options: &Options) -> Result<(Query, Option<TransformRule>)> {
    let query = Query::parse(&options.query)?;
    let rule = TransformRule::from_parts(options.pattern.as_deref(), options.replacement.as_deref())?;
    Ok((query, rule))
}

/// Runs the pipeline over an HTML string.
///
/// The query and pattern are both compiled before the document is parsed,
/// so a bad query or pattern is reported without doing any other work.
///
/// # Example
///
/// ```rust
/// use rs_pull::{pull, Error, Options};
///
/// let err = pull("<p>x</p>", &Options::new("//p[")).unwrap_err();
/// assert!(matches!(err, Error::MalformedQuery { .. }));
/// ```
pub fn pull(html: &str, options: &Options) -> Result<Extraction> {
    let (query, rule) = compile(options)?;
    extract::run(html, &query, rule.as_ref())
}

/// Runs the pipeline over raw bytes, detecting the encoding first.
///
/// ```rust
/// use rs_pull::{pull_bytes, Options};
///
/// let html = b"<html><head><meta charset=\"windows-1252\"></head><body><p>\x93hi\x94</p></body></html>";
/// let result = pull_bytes(html, None, &Options::new("//p"))?;
/// assert_eq!(result.lines, ["\u{201C}hi\u{201D}"]);
/// # Ok::<(), rs_pull::Error>(())
/// ```
pub fn pull_bytes(html: &[u8], charset: Option<&str>, options: &Options) -> Result<Extraction> {
    let (query, rule) = compile(options)?;
    let text = encoding::decode(html, charset);
    extract::run(&text, &query, rule.as_ref())
}

/// Fetches `url` and runs the pipeline over the page.
///
/// Query and pattern are validated before any request is made.
pub fn pull_url<F: Fetch + ?Sized>(fetcher: &F, url: &str, options: &Options) -> Result<Extraction> {
    let (query, rule) = compile(options)?;
    let page = fetcher.fetch(url)?;
    tracing::info!(url = %page.url, bytes = page.bytes.len(), "fetched page");
    extract::run(&page.text(), &query, rule.as_ref())
}
