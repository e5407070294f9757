//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Home directory could not be determined.
    #[error("could not determine the user home directory")]
    NoHomeDirectory,

    /// Configuration file is missing.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Expected file location.
        path: PathBuf,
    },

    /// I/O failure reading configuration or preparing directories.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Configuration file is not valid JSON.
    #[error("invalid configuration at {path}: {message}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A required value is absent.
    #[error("missing required configuration value `{key}`")]
    MissingValue {
        /// The absent key.
        key: &'static str,
    },

    /// Username and password must be configured together.
    #[error("`username` and `password` must be configured together")]
    PartialCredentials,
}

impl ConfigError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
