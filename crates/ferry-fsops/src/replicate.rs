//! Single-file copy with timestamp preservation and mode/ownership overrides.

use std::fs;
use std::path::{Path, PathBuf};

use ferry_config::{Ownership, ReplicationPolicy};
use filetime::{FileTime, set_file_times};
use tempfile::Builder;
use tracing::{error, info};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::ReplicationResult;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

#[cfg(unix)]
use nix::unistd::{Gid, Uid, chown};

const PART_PREFIX: &str = ".~tmp~";

/// Copies files into a flat destination directory.
///
/// Copies replace any same-named file already at the destination. The
/// content is first written to a uniquely named hidden sibling and renamed
/// into place, so the final name never points at a half-written file and
/// concurrent copies of same-named files never share a partial. The source
/// is only ever read.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReplicator {
    policy: ReplicationPolicy,
}

impl FileReplicator {
    /// Replicator applying the given mode and ownership overrides.
    #[must_use]
    pub const fn new(policy: ReplicationPolicy) -> Self {
        Self { policy }
    }

    /// Copy `source` into `destination_dir` under its base filename.
    ///
    /// Never fails outright: errors are logged and reported through
    /// [`ReplicationResult::reason`] so callers can move on to the next file.
    #[must_use]
    pub fn copy(&self, source: &Path, destination_dir: &Path) -> ReplicationResult {
        let intended = source.file_name().map_or_else(
            || destination_dir.to_path_buf(),
            |name| destination_dir.join(name),
        );

        match self.replicate(source, destination_dir) {
            Ok(copied) => {
                info!(
                    source = %source.display(),
                    destination = %copied.display(),
                    "copied file"
                );
                ReplicationResult::succeeded(source.to_path_buf(), copied)
            }
            Err(err) => {
                let reason = err.detail();
                error!(
                    source = %source.display(),
                    destination = %intended.display(),
                    error = %reason,
                    "copy abandoned"
                );
                ReplicationResult::failed(source.to_path_buf(), intended, reason)
            }
        }
    }

    fn replicate(&self, source: &Path, destination_dir: &Path) -> FsOpsResult<PathBuf> {
        if !destination_dir.is_dir() {
            error!(destination = %destination_dir.display(), "destination is not a directory");
        }
        if !source.is_file() {
            error!(source = %source.display(), "source is not a regular file");
        }

        let file_name = source.file_name().ok_or_else(|| FsOpsError::InvalidInput {
            field: "source_path",
            reason: "no_file_name",
            value: Some(source.display().to_string()),
        })?;
        let target = destination_dir.join(file_name);
        let part = Builder::new()
            .prefix(PART_PREFIX)
            .tempfile_in(destination_dir)
            .map_err(|source_err| {
                FsOpsError::io("replicate.create_part", destination_dir, source_err)
            })?;

        self.write_part(source, part.path())?;
        part.persist(&target).map_err(|persist_err| {
            FsOpsError::io("replicate.rename", &target, persist_err.error)
        })?;

        fs::canonicalize(&target)
            .map_err(|source_err| FsOpsError::io("replicate.canonicalize", &target, source_err))
    }

    fn write_part(&self, source: &Path, part: &Path) -> FsOpsResult<()> {
        let metadata = fs::metadata(source)
            .map_err(|source_err| FsOpsError::io("replicate.stat_source", source, source_err))?;
        fs::copy(source, part)
            .map_err(|source_err| FsOpsError::io("replicate.copy", part, source_err))?;

        let accessed = FileTime::from_last_access_time(&metadata);
        let modified = FileTime::from_last_modification_time(&metadata);
        set_file_times(part, accessed, modified)
            .map_err(|source_err| FsOpsError::io("replicate.preserve_times", part, source_err))?;

        if let Some(mode) = self.policy.file_mode {
            apply_mode(part, mode)?;
        }
        apply_ownership(part, self.policy.ownership)
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> FsOpsResult<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|source| FsOpsError::io("replicate.chmod", path, source))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> FsOpsResult<()> {
    Err(FsOpsError::Unsupported {
        operation: "replicate.chmod",
    })
}

#[cfg(unix)]
fn apply_ownership(path: &Path, ownership: Ownership) -> FsOpsResult<()> {
    if ownership.is_unchanged() {
        return Ok(());
    }
    chown(
        path,
        ownership.uid.map(Uid::from_raw),
        ownership.gid.map(Gid::from_raw),
    )
    .map_err(|source| FsOpsError::Nix {
        operation: "replicate.chown",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(unix))]
fn apply_ownership(_path: &Path, ownership: Ownership) -> FsOpsResult<()> {
    if ownership.is_unchanged() {
        return Ok(());
    }
    Err(FsOpsError::Unsupported {
        operation: "replicate.chown",
    })
}

#[cfg(all(unix, test))]
mod tests {
    use super::*;
    use ferry_test_support::fixtures::{ReplicaDirs, running_as_root, write_file};
    use std::error::Error;
    use std::os::unix::fs::MetadataExt;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    #[test]
    fn copy_preserves_content_and_timestamps() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "nested/report.csv", b"a,b,c\n1,2,3\n")?;
        let stamp = FileTime::from_unix_time(1_600_000_000, 0);
        set_file_times(&source, stamp, stamp)?;

        let result = FileReplicator::default().copy(&source, &dirs.destination);

        assert!(result.succeeded, "copy failed: {:?}", result.reason);
        assert_eq!(
            result.destination_path,
            fs::canonicalize(dirs.destination.join("report.csv"))?
        );
        assert_eq!(fs::read(&result.destination_path)?, b"a,b,c\n1,2,3\n");
        let copied = fs::metadata(&result.destination_path)?;
        assert_eq!(FileTime::from_last_modification_time(&copied), stamp);
        assert!(source.is_file());
        Ok(())
    }

    #[test]
    fn copy_twice_overwrites_with_identical_content() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "movie.mkv", &[42u8; 4096])?;
        let replicator = FileReplicator::new(ReplicationPolicy {
            file_mode: Some(0o444),
            ownership: Ownership::default(),
        });

        let first = replicator.copy(&source, &dirs.destination);
        let second = replicator.copy(&source, &dirs.destination);

        assert!(first.succeeded && second.succeeded, "{second:?}");
        assert_eq!(first.destination_path, second.destination_path);
        assert_eq!(fs::read(&second.destination_path)?, vec![42u8; 4096]);
        let leftovers: Vec<_> = fs::read_dir(&dirs.destination)?
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with(PART_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
        Ok(())
    }

    #[test]
    fn concurrent_same_named_copies_never_tear() -> TestResult<()> {
        const SIZE: usize = 8 * 1024 * 1024;
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let first = write_file(&dirs.source, "x/same.bin", &vec![b'a'; SIZE])?;
        let second = write_file(&dirs.source, "y/same.bin", &vec![b'b'; SIZE])?;
        let replicator = FileReplicator::default();

        for _ in 0..5 {
            let (left, right) = std::thread::scope(|scope| {
                let left = scope.spawn(|| replicator.copy(&first, &dirs.destination));
                let right = scope.spawn(|| replicator.copy(&second, &dirs.destination));
                (left.join(), right.join())
            });
            let (left, right) = (
                left.map_err(|_| "copy thread panicked")?,
                right.map_err(|_| "copy thread panicked")?,
            );
            assert!(left.succeeded, "{:?}", left.reason);
            assert!(right.succeeded, "{:?}", right.reason);

            let landed = fs::read(dirs.destination.join("same.bin"))?;
            assert_eq!(landed.len(), SIZE);
            assert!(
                landed.iter().all(|byte| *byte == b'a') || landed.iter().all(|byte| *byte == b'b'),
                "destination mixes both sources"
            );
        }
        Ok(())
    }

    #[test]
    fn unrelated_file_with_partial_prefix_survives() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let bystander = write_file(&dirs.destination, ".~tmp~notes.txt", b"mine")?;
        let source = write_file(&dirs.source, "notes.txt", b"theirs")?;

        let result = FileReplicator::default().copy(&source, &dirs.destination);

        assert!(result.succeeded, "{:?}", result.reason);
        assert_eq!(fs::read(&bystander)?, b"mine");
        assert_eq!(fs::read(dirs.destination.join("notes.txt"))?, b"theirs");
        Ok(())
    }

    #[test]
    fn mode_override_is_applied() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "script.sh", b"#!/bin/sh\n")?;
        fs::set_permissions(&source, fs::Permissions::from_mode(0o600))?;

        let result = FileReplicator::new(ReplicationPolicy {
            file_mode: Some(0o750),
            ownership: Ownership::default(),
        })
        .copy(&source, &dirs.destination);

        assert!(result.succeeded);
        let mode = fs::metadata(&result.destination_path)?.permissions().mode();
        assert_eq!(mode & 0o7777, 0o750);
        assert_eq!(fs::metadata(&source)?.permissions().mode() & 0o7777, 0o600);
        Ok(())
    }

    #[test]
    fn source_mode_is_kept_without_override() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "notes.txt", b"keep")?;
        fs::set_permissions(&source, fs::Permissions::from_mode(0o640))?;

        let result = FileReplicator::default().copy(&source, &dirs.destination);

        assert!(result.succeeded);
        let mode = fs::metadata(&result.destination_path)?.permissions().mode();
        assert_eq!(mode & 0o7777, 0o640);
        Ok(())
    }

    #[test]
    fn owner_override_leaves_group_untouched() -> TestResult<()> {
        if !running_as_root() {
            eprintln!("skipping owner_override_leaves_group_untouched: requires root");
            return Ok(());
        }
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "owned.bin", b"data")?;
        let ambient_gid = nix::unistd::getegid().as_raw();

        let result = FileReplicator::new(ReplicationPolicy {
            file_mode: None,
            ownership: Ownership {
                uid: Some(1000),
                gid: None,
            },
        })
        .copy(&source, &dirs.destination);

        assert!(result.succeeded, "{:?}", result.reason);
        let metadata = fs::metadata(&result.destination_path)?;
        assert_eq!(metadata.uid(), 1000);
        assert_eq!(metadata.gid(), ambient_gid);
        Ok(())
    }

    #[test]
    fn chown_without_privilege_is_reported_not_raised() -> TestResult<()> {
        if running_as_root() {
            eprintln!("skipping chown_without_privilege_is_reported_not_raised: running as root");
            return Ok(());
        }
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "foreign.bin", b"data")?;

        let result = FileReplicator::new(ReplicationPolicy {
            file_mode: None,
            ownership: Ownership {
                uid: Some(0),
                gid: None,
            },
        })
        .copy(&source, &dirs.destination);

        assert!(!result.succeeded);
        assert!(
            result
                .reason
                .as_deref()
                .is_some_and(|reason| reason.starts_with("replicate.chown"))
        );
        assert!(!dirs.destination.join("foreign.bin").exists());
        Ok(())
    }

    #[test]
    fn missing_destination_is_a_reported_failure() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let source = write_file(&dirs.source, "lost.bin", b"data")?;
        let missing = dirs.temp.path().join("nowhere");

        let result = FileReplicator::default().copy(&source, &missing);

        assert!(!result.succeeded);
        assert_eq!(result.destination_path, missing.join("lost.bin"));
        assert!(result.reason.is_some());
        Ok(())
    }

    #[test]
    fn vanished_source_is_a_reported_failure() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-replicate-")?;
        let result =
            FileReplicator::default().copy(&dirs.source.join("gone.bin"), &dirs.destination);
        assert!(!result.succeeded);
        assert!(
            result
                .reason
                .as_deref()
                .is_some_and(|reason| reason.starts_with("replicate.stat_source"))
        );
        Ok(())
    }
}
