//! Error types for the Retriever

use thiserror::Error;

/// Errors that can occur while fetching a document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// URL could not be parsed or is not http(s)
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// URL as given
        url: String,
        /// What was wrong with it
        reason: String,
    },

    /// Every attempt failed
    #[error("Unreachable after {attempts} attempt(s): {url}: {reason}")]
    Unreachable {
        /// URL requested
        url: String,
        /// Attempts made
        attempts: u32,
        /// Reason the last attempt failed
        reason: String,
    },

    /// Body exceeds the configured maximum
    #[error("Document too large: {size} bytes (max: {max})")]
    TooLarge {
        /// Declared or observed size in bytes
        size: u64,
        /// Configured maximum
        max: u64,
    },

    /// Server returned something other than a PDF or HTML document
    #[error("Wrong content type: expected {expected}, found {found}")]
    WrongContentType {
        /// What the URL or configuration called for
        expected: String,
        /// What the server declared
        found: String,
    },

    /// HTTP client could not be built from the configuration
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}
