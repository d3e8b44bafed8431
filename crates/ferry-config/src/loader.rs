//! Environment loading for [`Settings`].
//!
//! # Design
//! - `from_lookup` owns all parsing so tests can feed synthetic environments.
//! - `from_env` is the only place that touches the process environment.
//! - Filesystem preconditions live in `validate` and run separately.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::info;

use crate::defaults::{
    DEFAULT_DESTINATION, DEFAULT_LOG_LEVEL, DEFAULT_MODE, DEFAULT_SOURCE,
    DEFAULT_TRANSFER_TIMEOUT_MINUTES, DEFAULT_WORKERS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{LogLevel, Ownership, ReplicationPolicy, RunMode, Settings, StabilityPolicy};
use crate::validate::{
    parse_file_mode, parse_owner_id, parse_timeout_minutes, parse_workers, validate_roots,
};

impl Settings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error when any variable is present but malformed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error when any variable is present but malformed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let log_level = var("LOG_LEVEL")
            .as_deref()
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .parse::<LogLevel>()?;
        let log_format = var("LOG_FORMAT").map(|value| value.trim().to_ascii_lowercase());

        let timeout_minutes = var("TRANSFER_TIMEOUT")
            .map(|value| parse_timeout_minutes(&value))
            .transpose()?
            .unwrap_or(DEFAULT_TRANSFER_TIMEOUT_MINUTES);

        let source = PathBuf::from(var("SOURCE").unwrap_or_else(|| DEFAULT_SOURCE.to_string()));
        let destination =
            PathBuf::from(var("DESTINATION").unwrap_or_else(|| DEFAULT_DESTINATION.to_string()));
        let mode = var("MODE")
            .as_deref()
            .unwrap_or(DEFAULT_MODE)
            .parse::<RunMode>()?;

        let file_mode = var("CHMOD")
            .map(|value| parse_file_mode(&value))
            .transpose()?;
        let uid = var("UID")
            .map(|value| parse_owner_id("UID", &value))
            .transpose()?
            .flatten();
        let gid = var("GID")
            .map(|value| parse_owner_id("GID", &value))
            .transpose()?
            .flatten();

        let workers = match var("WORKERS") {
            Some(value) => parse_workers(&value)?,
            None => NonZeroUsize::new(DEFAULT_WORKERS).ok_or(ConfigError::InvalidField {
                field: "WORKERS",
                reason: "zero_default",
                value: None,
            })?,
        };

        Ok(Self {
            log_level,
            log_format,
            source,
            destination,
            mode,
            stability: StabilityPolicy::from_minutes(timeout_minutes),
            replication: ReplicationPolicy {
                file_mode,
                ownership: Ownership { uid, gid },
            },
            workers,
        })
    }

    /// Check filesystem preconditions for the configured roots.
    ///
    /// # Errors
    ///
    /// Returns an error when either root is missing or the destination is
    /// nested in the source.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_roots(&self.source, &self.destination)
    }

    /// Emit every effective value once at startup.
    pub fn log_effective(&self) {
        info!(
            log_level = self.log_level.as_str(),
            log_format = self.log_format.as_deref().unwrap_or("inferred"),
            transfer_timeout_secs = self.stability.timeout.as_secs(),
            source = %self.source.display(),
            destination = %self.destination.display(),
            mode = self.mode.as_str(),
            "effective configuration"
        );
        info!(
            chmod = %self
                .replication
                .file_mode
                .map_or_else(|| "unchanged".to_string(), |mode| format!("0o{mode:o}")),
            uid = ?self.replication.ownership.uid,
            gid = ?self.replication.ownership.gid,
            workers = self.workers.get(),
            "effective replication policy"
        );
    }
}
