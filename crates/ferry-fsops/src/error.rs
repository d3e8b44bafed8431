//! # Design
//!
//! - Provide structured, constant-message errors for file operations.
//! - Capture operation context (paths, fields, inputs) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced while sampling, walking, or copying files.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// Unsupported operation on this platform.
    #[error("fsops unsupported operation")]
    Unsupported {
        /// Operation that is unsupported.
        operation: &'static str,
    },
    /// Nix syscall failures.
    #[error("fsops nix failure")]
    Nix {
        /// Operation that triggered the nix failure.
        operation: &'static str,
        /// Path involved in the nix failure.
        path: PathBuf,
        /// Underlying nix error.
        source: nix::Error,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Single-line description with operation, path and root cause, used as
    /// the recorded failure reason.
    #[must_use]
    pub fn detail(&self) -> String {
        let cause = self
            .source()
            .map(ToString::to_string)
            .unwrap_or_default();
        match self {
            Self::Io {
                operation, path, ..
            }
            | Self::Walkdir {
                operation, path, ..
            }
            | Self::Nix {
                operation, path, ..
            } => format!("{operation} {}: {cause}", path.display()),
            Self::InvalidInput {
                field,
                reason,
                value,
            } => format!("{field} {reason}: {}", value.as_deref().unwrap_or("")),
            Self::Unsupported { operation } => format!("{operation}: unsupported"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_test_support::fixtures::temp_dir;
    use std::error::Error;
    use walkdir::WalkDir;

    #[test]
    fn fsops_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let io_err = FsOpsError::io("read", "path", io::Error::other("io"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());
        assert_eq!(io_err.detail(), "read path: io");

        let temp = temp_dir("ferry-fsops-")?;
        let missing = temp.path().join("missing");
        let walkdir_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = FsOpsError::walkdir("walk", &missing, walkdir_error);
        assert!(matches!(walk_err, FsOpsError::Walkdir { .. }));
        assert!(walk_err.source().is_some());
        assert!(walk_err.detail().starts_with("walk "));

        let input_err = FsOpsError::InvalidInput {
            field: "source_path",
            reason: "no_file_name",
            value: Some("/".to_string()),
        };
        assert_eq!(input_err.detail(), "source_path no_file_name: /");
        assert_eq!(input_err.to_string(), "fsops invalid input");
        Ok(())
    }
}
