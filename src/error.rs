//! Error types for rs-pull.
//!
//! Every stage of the pipeline reports through this one enum. An empty
//! result is not an error; see [`crate::Extraction::is_empty`].

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The page could not be retrieved (bad URL, transport error, non-success status).
    #[error("Error during web request to {url}: {message}")]
    Fetch {
        /// URL as given by the caller.
        url: String,
        /// Underlying transport or status message.
        message: String,
    },

    /// The path expression could not be parsed or does not select nodes.
    #[error("Invalid XPath string {query:?}: {message}")]
    MalformedQuery {
        /// The expression as given by the caller.
        query: String,
        /// Parser or evaluator message.
        message: String,
    },

    /// The transformation pattern failed to compile.
    #[error("Invalid regular expression {pattern:?}: {message}")]
    InvalidPattern {
        /// The pattern as given by the caller.
        pattern: String,
        /// Regex compiler message.
        message: String,
    },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
