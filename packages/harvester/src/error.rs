//! Error types for the harvester.
//!
//! Every failure bubbles up unchanged to the top of a run. A legislature page
//! without a JSON link is not an error and never shows up here.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Request failed, timed out, or returned a non-success status.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Response body was expected to be JSON but is not.
    #[error("Invalid JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// JSON value has no tabular interpretation.
    #[error("Cannot convert dataset to a table: {0}")]
    Conversion(String),

    /// CSV serialization failed.
    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    /// URL could not be parsed or resolved against its base.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Dataset title does not leave anything usable as a file name.
    #[error("Dataset title '{0}' does not produce a usable file name")]
    InvalidTitle(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
