//! Recursive enumeration of the source tree and the one-shot bulk pass.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::TreeSummary;
use crate::replicate::FileReplicator;

/// Lazy iterator over every regular file below a root.
///
/// Order is whatever the directory listing yields. Symlinks are reported as
/// neither files nor directories and are skipped. Each call to
/// [`walk_files`] starts a fresh traversal.
pub struct FileWalk {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl Iterator for FileWalk {
    type Item = FsOpsResult<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) if entry.file_type().is_file() => return Some(Ok(entry.into_path())),
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(FsOpsError::walkdir(
                        "walk_files",
                        &self.root,
                        source,
                    )));
                }
            }
        }
    }
}

/// Start walking `root` recursively.
#[must_use]
pub fn walk_files(root: &Path) -> FileWalk {
    FileWalk {
        root: root.to_path_buf(),
        inner: WalkDir::new(root).into_iter(),
    }
}

/// Copy every regular file under `source_root` into `destination`.
///
/// Files found here are assumed complete, so no stability wait happens.
/// Unreadable entries and failed copies are logged and counted; the pass
/// always runs to the end of the tree.
pub fn replicate_tree(
    replicator: &FileReplicator,
    source_root: &Path,
    destination: &Path,
) -> TreeSummary {
    let mut summary = TreeSummary::default();
    for item in walk_files(source_root) {
        match item {
            Ok(path) => {
                if replicator.copy(&path, destination).succeeded {
                    summary.copied += 1;
                } else {
                    summary.failed += 1;
                }
            }
            Err(err) => {
                summary.unreadable += 1;
                warn!(error = %err.detail(), "skipping unreadable entry during bulk pass");
            }
        }
    }
    info!(
        source = %source_root.display(),
        copied = summary.copied,
        failed = summary.failed,
        unreadable = summary.unreadable,
        "bulk pass complete"
    );
    summary
}
