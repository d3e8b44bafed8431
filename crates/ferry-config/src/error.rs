//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Environment variable that failed validation.
        field: &'static str,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Run mode value was not recognised.
    #[error("invalid run mode")]
    InvalidRunMode {
        /// Run mode payload provided by the operator.
        value: String,
    },
    /// Source root does not exist or is not a directory.
    #[error("source directory missing")]
    SourceMissing {
        /// Configured source path.
        path: PathBuf,
    },
    /// Destination does not exist or is not a directory.
    #[error("destination directory missing")]
    DestinationMissing {
        /// Configured destination path.
        path: PathBuf,
    },
    /// Destination is the source root or nested inside it.
    #[error("destination inside source")]
    DestinationInsideSource {
        /// Canonical source root.
        source_root: PathBuf,
        /// Canonical destination.
        destination: PathBuf,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
