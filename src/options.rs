//! Configuration options for a pipeline run and for page fetching.
//!
//! Both structs have public fields; use `Default::default()` plus struct
//! update syntax to override only what you need.

use std::time::Duration;

/// Default `User-Agent` header sent by [`crate::fetch::HttpFetcher`].
pub const DEFAULT_USER_AGENT: &str = concat!("rs-pull/", env!("CARGO_PKG_VERSION"));

/// Default request timeout for [`FetchOptions`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for one extraction run.
///
/// # Example
///
/// ```rust
/// use rs_pull::Options;
///
/// let options = Options {
///     pattern: Some(r"(\d+) points".to_string()),
///     replacement: Some("$1".to_string()),
///     ..Options::new("//span[@class='score']")
/// };
/// assert_eq!(options.query, "//span[@class='score']");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// XPath expression selecting the nodes to extract.
    pub query: String,

    /// Regular expression applied to every extracted fragment.
    ///
    /// `None` or an empty string disables the transformation stage.
    ///
    /// Default: `None`
    pub pattern: Option<String>,

    /// Replacement template for `pattern`.
    ///
    /// Ignored without a pattern. A missing replacement with a present
    /// pattern deletes every match.
    ///
    /// Default: `None`
    pub replacement: Option<String>,
}

impl Options {
    /// Options selecting `query` with no transformation.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Adds a transformation rule.
    #[must_use]
    pub fn with_rule(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.replacement = Some(replacement.into());
        self
    }
}

/// Configuration for [`crate::fetch::HttpFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// `User-Agent` header value.
    ///
    /// Default: [`DEFAULT_USER_AGENT`]
    pub user_agent: String,

    /// Whole-request timeout. `None` waits indefinitely.
    ///
    /// Default: 30 seconds
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_no_rule() {
        let options = Options::new("//p");
        assert_eq!(options.query, "//p");
        assert!(options.pattern.is_none());
        assert!(options.replacement.is_none());
    }

    #[test]
    fn with_rule_sets_both_parts() {
        let options = Options::new("//p").with_rule("a", "b");
        assert_eq!(options.pattern.as_deref(), Some("a"));
        assert_eq!(options.replacement.as_deref(), Some("b"));
    }

    #[test]
    fn fetch_defaults() {
        let options = FetchOptions::default();
        assert!(options.user_agent.starts_with("rs-pull/"));
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
    }
}
