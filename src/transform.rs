//! Transformer
//!
//! Rewrites every fragment with one regular expression. Matching is
//! case-insensitive and multi-line, and every occurrence is replaced.
//!
//! Replacement templates accept `$1`, `${1}`, `${name}`, `$&` (whole match)
//! and `$$` (literal dollar). A group number directly followed by letters,
//! as in `$1st`, refers to group 1 followed by the literal `st`. Any other
//! `$`, as in `$USD`, is literal text.

use std::borrow::Cow;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

/// A compiled pattern and its replacement template.
#[derive(Debug, Clone)]
pub struct TransformRule {
    regex: Regex,
    replacement: String,
}

impl TransformRule {
    /// Compiles `pattern`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rs_pull::TransformRule;
    ///
    /// let rule = TransformRule::new(r"a(\d)", "[$1]")?;
    /// assert_eq!(rule.apply("a1 A2 a3"), "[1] [2] [3]");
    /// # Ok::<(), rs_pull::Error>(())
    /// ```
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| Error::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            regex,
            replacement: normalize_template(replacement),
        })
    }

    /// Builds an optional rule. An absent or empty pattern means no rule;
    /// an absent replacement deletes matches.
    pub fn from_parts(pattern: Option<&str>, replacement: Option<&str>) -> Result<Option<Self>> {
        match pattern {
            Some(pattern) if !pattern.is_empty() => {
                Self::new(pattern, replacement.unwrap_or_default()).map(Some)
            }
            _ => Ok(None),
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replaces every match in `fragment`.
    #[must_use]
    pub fn apply<'a>(&self, fragment: &'a str) -> Cow<'a, str> {
        self.regex.replace_all(fragment, self.replacement.as_str())
    }
}

/// Applies `rule` to each fragment. Output length always equals input length.
#[must_use]
pub fn transform(fragments: Vec<String>, rule: Option<&TransformRule>) -> Vec<String> {
    let Some(rule) = rule else {
        return fragments;
    };
    fragments
        .into_iter()
        .map(|fragment| {
            let changed = match rule.apply(&fragment) {
                Cow::Owned(changed) => Some(changed),
                Cow::Borrowed(_) => None,
            };
            changed.unwrap_or(fragment)
        })
        .collect()
}

/// Rewrites a template into the `regex` crate's syntax.
///
/// `$12abc` becomes `${12}abc`, `$&` becomes `${0}` and a `$` that starts
/// no reference becomes `$$`; everything else is passed through.
fn normalize_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('$') => {
                chars.next();
                out.push_str("$$");
            }
            Some('&') => {
                chars.next();
                out.push_str("${0}");
            }
            Some(d) if d.is_ascii_digit() => {
                out.push_str("${");
                while let Some(d) = chars.next_if(char::is_ascii_digit) {
                    out.push(d);
                }
                out.push('}');
            }
            Some('{') => {
                out.push('$');
                for c in chars.by_ref() {
                    out.push(c);
                    if c == '}' {
                        break;
                    }
                }
            }
            _ => out.push_str("$$"),
        }
    }

    out
}
