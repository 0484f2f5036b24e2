//! Page retrieval.
//!
//! [`Fetch`] is the seam between the pipeline and the network. The
//! production implementation, [`HttpFetcher`], issues one blocking GET.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::encoding;
use crate::error::{Error, Result};
use crate::options::FetchOptions;

/// A retrieved page, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL after redirects.
    pub url: Url,
    /// Raw response body.
    pub bytes: Vec<u8>,
    /// Charset label from the `Content-Type` header, if any.
    pub charset: Option<String>,
}

impl Page {
    /// Decodes the body; see [`encoding::decode`].
    #[must_use]
    pub fn text(&self) -> String {
        encoding::decode(&self.bytes, self.charset.as_deref())
    }
}

/// Something that can retrieve the bytes behind a URL.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Page>;
}

/// Parses a user-supplied URL, assuming `http://` when no scheme is given.
///
/// ```rust
/// use rs_pull::fetch::parse_url;
///
/// assert_eq!(parse_url("example.com/a")?.as_str(), "http://example.com/a");
/// assert_eq!(parse_url("https://example.com")?.scheme(), "https");
/// assert!(parse_url("ftp://example.com").is_err());
/// # Ok::<(), rs_pull::Error>(())
/// ```
pub fn parse_url(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    let invalid = |message: String| Error::Fetch {
        url: raw.to_string(),
        message,
    };

    let url = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
    .map_err(|e| invalid(format!("invalid URL: {e}")))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }
    Ok(url)
}

/// Blocking HTTP(S) fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::Fetch {
                url: String::new(),
                message: format!("could not build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Page> {
        let parsed = parse_url(url)?;
        let failed = |message: String| Error::Fetch {
            url: url.to_string(),
            message,
        };

        tracing::debug!(url = %parsed, "fetching page");
        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("server responded with status {status}")));
        }

        let final_url = response.url().clone();
        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(encoding::header_charset);
        let bytes = response
            .bytes()
            .map_err(|e| failed(format!("could not read response body: {e}")))?
            .to_vec();

        tracing::debug!(url = %final_url, bytes = bytes.len(), status = status.as_u16(), "received response");
        Ok(Page {
            url: final_url,
            bytes,
            charset,
        })
    }
}
