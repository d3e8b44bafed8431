//! Default values applied when an environment variable is absent.
//!
//! # Design
//! - Keep every fallback in one place so the loader and tests agree.
//! - Durations are expressed as `Duration` constants, not raw integers.

use std::time::Duration;

/// Source root watched and walked when `SOURCE` is unset.
pub const DEFAULT_SOURCE: &str = "/source";
/// Destination directory written when `DESTINATION` is unset.
pub const DEFAULT_DESTINATION: &str = "/destination";
/// Run mode used when `MODE` is unset.
pub const DEFAULT_MODE: &str = "NEW";
/// Transfer timeout, in minutes, used when `TRANSFER_TIMEOUT` is unset.
pub const DEFAULT_TRANSFER_TIMEOUT_MINUTES: u64 = 15;
/// Log level used when `LOG_LEVEL` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Owner/group sentinel meaning "leave unchanged".
pub const UNCHANGED_ID: i64 = -1;
/// Number of notifications the router handles at once.
pub const DEFAULT_WORKERS: usize = 1;
/// Delay between two size samples while waiting for a transfer to settle.
pub const STABILITY_POLL_INTERVAL: Duration = Duration::from_secs(2);
