//! Validation helpers and parsing utilities for environment values.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::defaults::UNCHANGED_ID;
use crate::error::{ConfigError, ConfigResult};

const MAX_FILE_MODE: u32 = 0o7777;

/// Parse `TRANSFER_TIMEOUT` as a whole number of minutes.
///
/// # Errors
///
/// Returns an error when the value is not a non-negative integer.
pub fn parse_timeout_minutes(value: &str) -> ConfigResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::invalid("TRANSFER_TIMEOUT", "not_minutes", value))
}

/// Parse a numeric owner or group id; `-1` yields `None` (leave unchanged).
///
/// # Errors
///
/// Returns an error for non-integers, negative values other than `-1`, and
/// ids that do not fit in 32 bits.
pub fn parse_owner_id(field: &'static str, value: &str) -> ConfigResult<Option<u32>> {
    let raw = value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid(field, "not_integer", value))?;
    if raw == UNCHANGED_ID {
        return Ok(None);
    }
    if raw < 0 {
        return Err(ConfigError::invalid(field, "negative", value));
    }
    u32::try_from(raw)
        .map(Some)
        .map_err(|_| ConfigError::invalid(field, "out_of_range", value))
}

/// Parse an octal permission string such as `644`, `0644` or `0o640`.
///
/// # Errors
///
/// Returns an error when the value is empty, not octal, or exceeds `0o7777`.
pub fn parse_file_mode(value: &str) -> ConfigResult<u32> {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(ConfigError::invalid("CHMOD", "empty", value));
    }
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|_| ConfigError::invalid("CHMOD", "not_octal", value))?;
    if mode > MAX_FILE_MODE {
        return Err(ConfigError::invalid("CHMOD", "out_of_range", value));
    }
    Ok(mode)
}

/// Parse the router concurrency bound.
///
/// # Errors
///
/// Returns an error unless the value is a positive integer.
pub fn parse_workers(value: &str) -> ConfigResult<NonZeroUsize> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::invalid("WORKERS", "not_positive", value))
}

/// Check the source and destination roots before any work starts.
///
/// Both must be existing directories, and the destination must not be the
/// source or sit anywhere beneath it; otherwise watching the source would
/// pick up every copy written to the destination.
///
/// # Errors
///
/// Returns the first precondition that fails.
pub fn validate_roots(source: &Path, destination: &Path) -> ConfigResult<()> {
    if !source.is_dir() {
        return Err(ConfigError::SourceMissing {
            path: source.to_path_buf(),
        });
    }
    if !destination.is_dir() {
        return Err(ConfigError::DestinationMissing {
            path: destination.to_path_buf(),
        });
    }

    let source_root = canonical("validate.canonical_source", source)?;
    let destination = canonical("validate.canonical_destination", destination)?;
    if destination.starts_with(&source_root) {
        return Err(ConfigError::DestinationInsideSource {
            source_root,
            destination,
        });
    }
    Ok(())
}

fn canonical(operation: &'static str, path: &Path) -> ConfigResult<PathBuf> {
    fs::canonicalize(path).map_err(|source| ConfigError::Io {
        operation,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_test_support::fixtures::temp_dir;
    use std::error::Error;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[test]
    fn owner_id_sentinel_means_unchanged() -> TestResult<()> {
        assert_eq!(parse_owner_id("UID", "-1")?, None);
        assert_eq!(parse_owner_id("UID", " 1000 ")?, Some(1000));
        assert!(matches!(
            parse_owner_id("GID", "-2"),
            Err(ConfigError::InvalidField {
                field: "GID",
                reason: "negative",
                ..
            })
        ));
        assert!(parse_owner_id("UID", "root").is_err());
        assert!(parse_owner_id("UID", "4294967296").is_err());
        Ok(())
    }

    #[test]
    fn file_mode_accepts_octal_forms() -> TestResult<()> {
        assert_eq!(parse_file_mode("644")?, 0o644);
        assert_eq!(parse_file_mode("0640")?, 0o640);
        assert_eq!(parse_file_mode("0o755")?, 0o755);
        assert!(parse_file_mode("888").is_err());
        assert!(parse_file_mode("17777").is_err());
        assert!(parse_file_mode("0o").is_err());
        Ok(())
    }

    #[test]
    fn timeout_and_workers_reject_garbage() -> TestResult<()> {
        assert_eq!(parse_timeout_minutes("15")?, 15);
        assert!(parse_timeout_minutes("-3").is_err());
        assert!(parse_timeout_minutes("soon").is_err());
        assert_eq!(parse_workers("4")?.get(), 4);
        assert!(parse_workers("0").is_err());
        Ok(())
    }

    #[test]
    fn roots_must_exist() -> TestResult<()> {
        let temp = temp_dir("ferry-config-")?;
        let source = temp.path().join("source");
        let destination = temp.path().join("destination");
        std::fs::create_dir_all(&destination)?;

        assert!(matches!(
            validate_roots(&source, &destination),
            Err(ConfigError::SourceMissing { .. })
        ));
        std::fs::create_dir_all(&source)?;
        std::fs::remove_dir(&destination)?;
        assert!(matches!(
            validate_roots(&source, &destination),
            Err(ConfigError::DestinationMissing { .. })
        ));
        std::fs::create_dir_all(&destination)?;
        validate_roots(&source, &destination)?;
        Ok(())
    }

    #[test]
    fn destination_inside_source_is_rejected() -> TestResult<()> {
        let temp = temp_dir("ferry-config-")?;
        let source = temp.path().join("source");
        let nested = source.join("out");
        std::fs::create_dir_all(&nested)?;

        assert!(matches!(
            validate_roots(&source, &nested),
            Err(ConfigError::DestinationInsideSource { .. })
        ));
        assert!(matches!(
            validate_roots(&source, &source),
            Err(ConfigError::DestinationInsideSource { .. })
        ));

        let sibling = temp.path().join("source-copies");
        std::fs::create_dir_all(&sibling)?;
        validate_roots(&source, &sibling)?;
        Ok(())
    }
}
