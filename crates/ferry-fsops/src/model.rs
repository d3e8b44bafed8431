//! Outcome and result types for the replication pipeline.
//!
//! # Design
//! - Keep request/response types lightweight and cloneable.
//! - Avoid embedding IO handles; callers supply paths.

use std::path::PathBuf;

use tokio::time::Instant;

/// Verdict of waiting for a file to stop changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilityOutcome {
    /// Two consecutive samples saw the same size.
    Stable,
    /// The file kept changing until the budget ran out.
    TimedOut,
    /// The path stopped being a regular file.
    Removed,
}

impl StabilityOutcome {
    /// Machine-friendly label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::TimedOut => "timed_out",
            Self::Removed => "removed",
        }
    }
}

/// Per-call sampling state; lives only for the duration of one wait.
#[derive(Debug, Clone, Copy)]
pub struct TransferState {
    /// Size seen on the previous sample; `None` until the first sample so
    /// that an empty file is not mistaken for an unchanged one.
    pub last_observed_size: Option<u64>,
    /// When sampling began.
    pub started_at: Instant,
}

impl TransferState {
    /// Fresh state with no samples taken.
    #[must_use]
    pub const fn new(started_at: Instant) -> Self {
        Self {
            last_observed_size: None,
            started_at,
        }
    }
}

/// Outcome of one copy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationResult {
    /// File that was copied.
    pub source_path: PathBuf,
    /// Canonical path of the copy on success; the intended path otherwise.
    pub destination_path: PathBuf,
    /// Whether the copy and every metadata override succeeded.
    pub succeeded: bool,
    /// Failure description when `succeeded` is false.
    pub reason: Option<String>,
}

impl ReplicationResult {
    /// Successful copy.
    #[must_use]
    pub const fn succeeded(source_path: PathBuf, destination_path: PathBuf) -> Self {
        Self {
            source_path,
            destination_path,
            succeeded: true,
            reason: None,
        }
    }

    /// Abandoned copy with the recorded reason.
    #[must_use]
    pub const fn failed(source_path: PathBuf, destination_path: PathBuf, reason: String) -> Self {
        Self {
            source_path,
            destination_path,
            succeeded: false,
            reason: Some(reason),
        }
    }
}

/// Counters from a bulk pass over the source tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeSummary {
    /// Files copied successfully.
    pub copied: usize,
    /// Files whose copy was abandoned.
    pub failed: usize,
    /// Directory entries that could not be read during the walk.
    pub unreadable: usize,
}
