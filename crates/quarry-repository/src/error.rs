//! Error types for artifact fetching.

use quarry_core::CoordinateError;
use std::path::PathBuf;
use thiserror::Error;

/// Fetch-and-cache error types.
///
/// The enum is `Clone` because a transfer records its terminal error once
/// and replays it verbatim to every current and future reader and waiter.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Bad coordinate input.
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),

    /// Remote answered with a status other than 200 OK.
    #[error("HTTP status {status} for {url}")]
    HttpStatus {
        /// The status code received.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Transport-level failure before or during the transfer.
    #[error("network error for {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Error message.
        message: String,
    },

    /// I/O failure with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The file held fewer bytes than the published progress counter.
    #[error("premature end of file: {path}")]
    PrematureEof {
        /// The file being read.
        path: PathBuf,
    },

    /// The transfer ended before a skip request could be satisfied.
    #[error("unexpected end of file while skipping: {path}")]
    UnexpectedEof {
        /// The file being read.
        path: PathBuf,
    },

    /// The metadata document could not be parsed or lacks required fields.
    #[error("invalid metadata document: {message}")]
    Metadata {
        /// Parser or structural message.
        message: String,
    },

    /// The metadata document describes a different artifact.
    #[error("metadata {field} `{found}` does not match requested `{expected}`")]
    MetadataMismatch {
        /// The disagreeing element.
        field: &'static str,
        /// Value derived from the request.
        expected: String,
        /// Value found in the document.
        found: String,
    },

    /// No snapshot version entry matches the requested classifier/type.
    #[error("no matching snapshot version for {coordinate}")]
    NoMatchingSnapshotVersion {
        /// The requested coordinate.
        coordinate: String,
    },

    /// A derived URL is not valid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP client construction failed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a network error for a URL.
    #[must_use]
    pub fn network(url: &url::Url, err: &reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Create a metadata error.
    #[must_use]
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata {
            message: message.into(),
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
