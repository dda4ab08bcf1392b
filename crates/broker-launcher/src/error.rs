//! Stub launcher error types.

use thiserror::Error;

/// Errors raised while decoding a stub spec, selecting a capability, or
/// preparing to exec the target command.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// `STUB_SPEC` was not valid base64, not valid JSON, or missing a
    /// required field (`stub` or `command`).
    #[error("invalid stub spec: {0}")]
    BadSpec(String),

    /// `<CAP_ROOT>/<stub>` does not exist.
    #[error("no capability directory for stub '{stub}'")]
    NoCapabilityDirectory {
        /// The stub that was looked up.
        stub: String,
    },

    /// No capability token under the stub directory satisfied the
    /// selection criteria (matching stub, unexpired, carrying a session
    /// key).
    #[error("no valid (unexpired) capabilities for stub '{stub}'")]
    NoValidCapability {
        /// The stub that was looked up.
        stub: String,
    },

    /// A sealed secret record's `stub`/`capability_id` did not match the
    /// selected capability.
    #[error("sealed record for '{name}' does not match the selected capability")]
    SealedRecordMismatch {
        /// The secret name whose record failed to match.
        name: String,
    },

    /// An `env` entry in the stub spec was a JSON array or object rather
    /// than a scalar string.
    #[error("env value for '{name}' resolves to a non-scalar value")]
    CompoundEnvValue {
        /// The offending env var name.
        name: String,
    },

    /// The resolved `command` was empty after substitution.
    #[error("resolved command is empty")]
    EmptyCommand,

    /// Unsealing a secret failed (invalid hex/base64/UTF-8).
    #[error(transparent)]
    Crypto(#[from] broker_crypto::CryptoError),

    /// I/O failure reading the capability directory or a sealed record.
    #[error("I/O error: {0}")]
    Io(String),

    /// `execvpe` itself failed (binary not found, not executable, ...).
    #[error("exec failed: {0}")]
    Exec(String),
}

impl From<std::io::Error> for LaunchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for stub launcher operations.
pub type LaunchResult<T> = Result<T, LaunchError>;
