//! Path Selector
//!
//! Evaluates XPath 1.0 expressions against a normalized [`Document`]:
//!
//! - absolute and relative location paths, `//`, `.`, `..`, `@name`
//! - all thirteen axes; `namespace` is always empty for HTML
//! - node tests `name`, `*`, `text()`, `comment()`, `node()` and
//!   `processing-instruction()`, which never matches because the HTML parser
//!   keeps processing instructions as comments
//! - predicates, filter expressions and unions
//! - `or`, `and`, comparisons, `+`, `-`, `*`, `div`, `mod` and unary `-`
//! - the core function library, with `id()` looking at `id` attributes and
//!   `lang()` at `lang` attributes
//!
//! Namespace prefixes and variable references are rejected, since there is
//! no context to resolve them in.
//!
//! Names are matched case-sensitively against the lower-cased tree.
//!
//! # Example
//!
//! ```rust
//! use rs_pull::dom::Document;
//! use rs_pull::xpath::Query;
//!
//! let doc = Document::parse(r#"<a href="/one">1</a><a href="/two">2</a>"#);
//! let query = Query::parse("//a/@href")?;
//! let hrefs: Vec<_> = query
//!     .select(&doc)?
//!     .into_iter()
//!     .map(|id| doc.string_value(id))
//!     .collect();
//! assert_eq!(hrefs, ["/one", "/two"]);
//! # Ok::<(), rs_pull::Error>(())
//! ```

mod eval;
mod lexer;
mod parser;

use std::fmt;

use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};

use eval::{Evaluator, Value};
use parser::Expr;

/// Syntax error with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct Query {
    source: String,
    expr: Expr,
}

impl Query {
    /// Parses `source`.
    ///
    /// Fails with [`Error::MalformedQuery`] when the expression is not
    /// valid XPath in the supported subset.
    pub fn parse(source: &str) -> Result<Self> {
        let malformed = |e: SyntaxError| Error::MalformedQuery {
            query: source.to_string(),
            message: e.to_string(),
        };
        let tokens = lexer::tokenize(source).map_err(malformed)?;
        let expr = parser::parse(&tokens, source.len()).map_err(malformed)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// The expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Selects matching nodes in document order, without duplicates.
    ///
    /// An expression that evaluates to a string, number or boolean rather
    /// than a node-set is reported as [`Error::MalformedQuery`].
    pub fn select(&self, doc: &Document) -> Result<Vec<NodeId>> {
        let malformed = |message: String| Error::MalformedQuery {
            query: self.source.clone(),
            message,
        };
        match Evaluator::new(doc).evaluate(&self.expr).map_err(malformed)? {
            Value::Nodes(nodes) => Ok(nodes),
            other => Err(malformed(format!(
                "expression evaluates to a {} instead of a node-set",
                other.type_name()
            ))),
        }
    }
}

impl std::str::FromStr for Query {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
