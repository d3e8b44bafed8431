//! # Design
//!
//! - Centralize application-level errors for bootstrap and orchestration.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors without re-logging at call sites.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration loading or validation failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ferry_config::ConfigError,
    },
    /// Telemetry operations failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: ferry_telemetry::TelemetryError,
    },
    /// The filesystem notification backend failed.
    #[error("watch subscription failed")]
    Watch {
        /// Operation identifier.
        operation: &'static str,
        /// Root being watched, when known.
        path: Option<PathBuf>,
        /// Backend-provided description of the failure.
        detail: String,
    },
    /// The notification queue ended while the watcher was expected to run.
    #[error("watch channel closed")]
    WatchChannelClosed,
    /// Installing a signal handler failed.
    #[error("signal handler installation failed")]
    Signal {
        /// Signal name.
        signal: &'static str,
        /// Source IO error.
        source: io::Error,
    },
    /// A background task panicked or was cancelled.
    #[error("background task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: tokio::task::JoinError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: ferry_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: ferry_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) fn watch(
        operation: &'static str,
        path: Option<&Path>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Watch {
            operation,
            path: path.map(Path::to_path_buf),
            detail: detail.into(),
        }
    }

    pub(crate) const fn signal(signal: &'static str, source: io::Error) -> Self {
        Self::Signal { signal, source }
    }

    pub(crate) const fn join(operation: &'static str, source: tokio::task::JoinError) -> Self {
        Self::Join { operation, source }
    }
}
