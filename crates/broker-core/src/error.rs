//! Core error types shared across the broker crates.

use thiserror::Error;

/// Errors raised while resolving broker directories or tunable defaults.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An environment-variable directory override was not an absolute path.
    #[error("{var} must be an absolute path, got {value:?}")]
    NotAbsolute {
        /// The environment variable that was set.
        var: String,
        /// The value it was set to.
        value: String,
    },

    /// No home directory could be determined for the default location.
    #[error("could not determine a home directory: {0}")]
    NoHomeDirectory(String),

    /// A tunable environment variable was set but could not be parsed.
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidTunable {
        /// The environment variable that was set.
        var: String,
        /// The value it was set to.
        value: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Directory creation or permission setup failed.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
