//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers built once at startup and passed by reference.
//! - Keeps parsing in `validate.rs` and environment access in `loader.rs`.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::defaults::STABILITY_POLL_INTERVAL;
use crate::error::ConfigError;

/// Fully resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Verbosity applied to the tracing subscriber.
    pub log_level: LogLevel,
    /// Requested log output format (`json` or `pretty`), if overridden.
    pub log_format: Option<String>,
    /// Root of the tree files arrive in.
    pub source: PathBuf,
    /// Directory copies are written to.
    pub destination: PathBuf,
    /// Which passes the orchestrator runs.
    pub mode: RunMode,
    /// Transfer-completion heuristic parameters.
    pub stability: StabilityPolicy,
    /// Mode and ownership applied to each copy.
    pub replication: ReplicationPolicy,
    /// Upper bound on notifications handled at the same time.
    pub workers: NonZeroUsize,
}

/// Run mode selected through `MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Replicate the existing tree once, then exit.
    OneShot,
    /// Watch the source tree for new arrivals until terminated.
    Watch,
    /// Replicate the existing tree, then keep watching.
    Both,
}

impl RunMode {
    /// Canonical label used in logs and the environment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneShot => "ONESHOT",
            Self::Watch => "NEW",
            Self::Both => "BOTH",
        }
    }

    /// Whether the mode starts with a bulk pass over the existing tree.
    #[must_use]
    pub const fn runs_bulk_pass(self) -> bool {
        matches!(self, Self::OneShot | Self::Both)
    }

    /// Whether the mode subscribes to filesystem notifications.
    #[must_use]
    pub const fn watches(self) -> bool {
        matches!(self, Self::Watch | Self::Both)
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ONESHOT" => Ok(Self::OneShot),
            "NEW" | "WATCH" => Ok(Self::Watch),
            "BOTH" => Ok(Self::Both),
            _ => Err(ConfigError::InvalidRunMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log verbosity accepted through `LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Everything, including per-poll sampling.
    Trace,
    /// Diagnostic detail.
    Debug,
    /// Normal operational output.
    Info,
    /// Recoverable problems only.
    Warn,
    /// Failures only.
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "critical" | "fatal" => Ok(Self::Error),
            _ => Err(ConfigError::invalid("LOG_LEVEL", "unknown_level", s)),
        }
    }
}

/// Parameters of the transfer-completion heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityPolicy {
    /// Wall-clock budget for a single file to settle.
    pub timeout: Duration,
    /// Delay between two size samples.
    pub poll_interval: Duration,
}

impl StabilityPolicy {
    /// Policy with the production poll interval and a timeout in minutes.
    #[must_use]
    pub const fn from_minutes(minutes: u64) -> Self {
        Self {
            timeout: Duration::from_secs(minutes.saturating_mul(60)),
            poll_interval: STABILITY_POLL_INTERVAL,
        }
    }
}

/// Owner and group applied to every copy; `None` leaves the id unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ownership {
    /// Numeric owner id.
    pub uid: Option<u32>,
    /// Numeric group id.
    pub gid: Option<u32>,
}

impl Ownership {
    /// True when neither id is changed.
    #[must_use]
    pub const fn is_unchanged(self) -> bool {
        self.uid.is_none() && self.gid.is_none()
    }
}

/// Metadata overrides applied after a file is copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicationPolicy {
    /// Permission bits forced onto the copy, when configured.
    pub file_mode: Option<u32>,
    /// Ownership forced onto the copy.
    pub ownership: Ownership,
}
