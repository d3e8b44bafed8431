//! Filesystem fixtures for replication tests.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Create a fresh temporary directory with a recognisable prefix.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn temp_dir(prefix: &str) -> io::Result<TempDir> {
    tempfile::Builder::new().prefix(prefix).tempdir()
}

/// Source and destination roots living side by side in one temp directory.
#[derive(Debug)]
pub struct ReplicaDirs {
    /// Owns the backing directory; dropping it removes both roots.
    pub temp: TempDir,
    /// Root files arrive in.
    pub source: PathBuf,
    /// Directory copies land in.
    pub destination: PathBuf,
}

impl ReplicaDirs {
    /// Create `source/` and `destination/` under a new temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn new(prefix: &str) -> io::Result<Self> {
        let temp = temp_dir(prefix)?;
        let source = temp.path().join("source");
        let destination = temp.path().join("destination");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&destination)?;
        Ok(Self {
            temp,
            source,
            destination,
        })
    }
}

/// Write `contents` to `root/relative`, creating parent directories.
///
/// # Errors
///
/// Returns an error if any directory or the file cannot be written.
pub fn write_file(root: &Path, relative: &str, contents: &[u8]) -> io::Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    Ok(path)
}

/// Append `contents` to an existing (or new) file, simulating a slow upload.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub fn append_bytes(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(contents)?;
    file.flush()
}

/// Returns `true` when the test process may change file ownership freely.
#[must_use]
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}
