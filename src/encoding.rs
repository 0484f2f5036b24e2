//! Character encoding detection and decoding of fetched pages.
//!
//! Detection order: byte-order mark, the charset from the HTTP
//! `Content-Type` header, a `<meta>` declaration in the first 1024 bytes,
//! then UTF-8.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>/;]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Match the `charset` parameter of a `Content-Type` header value
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// Detects the encoding of `html`.
///
/// `header_charset` is the label from the HTTP response, if any. Unknown
/// labels are ignored.
#[must_use]
pub fn detect_encoding(html: &[u8], header_charset: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _bom_len)) = Encoding::for_bom(html) {
        return encoding;
    }

    if let Some(encoding) = header_charset.and_then(|label| Encoding::for_label(label.trim().as_bytes())) {
        return encoding;
    }

    // Only look at first 1024 bytes for performance
    let head = &html[..html.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    // An unknown label in one declaration falls through to the next.
    for declared in [extract_charset(&head_str), extract_content_type_charset(&head_str)] {
        if let Some(encoding) = declared.and_then(|label| Encoding::for_label(label.as_bytes())) {
            return encoding;
        }
    }

    UTF_8
}

/// Extract the charset parameter from a `Content-Type` header value.
#[must_use]
pub fn header_charset(content_type: &str) -> Option<String> {
    HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract charset from `<meta charset="...">` tag.
fn extract_charset(html: &str) -> Option<String> {
    CHARSET_META_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract charset from `<meta http-equiv="Content-Type" content="...; charset=...">` tag.
fn extract_content_type_charset(html: &str) -> Option<String> {
    CONTENT_TYPE_CHARSET_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Decodes page bytes to a string.
///
/// A byte-order mark is consumed. Malformed sequences become U+FFFD and are
/// reported with a warning rather than failing the run.
///
/// # Examples
///
/// ```
/// use rs_pull::encoding::decode;
///
/// let latin1 = b"<html><head><meta charset=\"ISO-8859-1\"></head><body>Caf\xE9</body></html>";
/// assert!(decode(latin1, None).contains("Café"));
///
/// let bom = b"\xEF\xBB\xBF<p>x</p>";
/// assert_eq!(decode(bom, Some("windows-1252")), "<p>x</p>");
/// ```
#[must_use]
pub fn decode(html: &[u8], header_charset: Option<&str>) -> String {
    let encoding = detect_encoding(html, header_charset);
    // `decode` re-sniffs the BOM, which agrees with detection above.
    let (decoded, used, had_errors) = encoding.decode(html);
    if had_errors {
        tracing::warn!(
            encoding = used.name(),
            "page contained byte sequences invalid for its encoding; replaced with U+FFFD"
        );
    }
    tracing::debug!(encoding = used.name(), bytes = html.len(), "decoded page");
    decoded.into_owned()
}
