//! Notification payloads produced by the watch backend.

use std::path::{Path, PathBuf};

/// Capacity of the queue between the watch thread and the router.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// Kind of change reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchEventKind {
    /// A new path appeared.
    Created,
    /// A path disappeared.
    Deleted,
    /// Content or attributes of an existing path changed.
    Modified,
    /// A path was renamed or moved into place.
    Moved,
}

impl WatchEventKind {
    /// Machine-friendly label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::Modified => "modified",
            Self::Moved => "moved",
        }
    }

    /// Whether this kind can introduce a new file that needs replicating.
    #[must_use]
    pub const fn is_arrival(self) -> bool {
        matches!(self, Self::Created | Self::Moved)
    }
}

/// One change notification for a path under the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path the change was reported for; the old name for moves.
    pub path_old: PathBuf,
    /// New name for moves; `None` for every other kind.
    pub path_new: Option<PathBuf>,
    /// Kind of change.
    pub kind: WatchEventKind,
    /// Whether the path refers to a directory.
    pub is_directory: bool,
}

impl WatchEvent {
    /// Notification for a newly created file.
    #[must_use]
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::single(path, WatchEventKind::Created)
    }

    /// Notification for a removed path.
    #[must_use]
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::single(path, WatchEventKind::Deleted)
    }

    /// Notification for an in-place change.
    #[must_use]
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::single(path, WatchEventKind::Modified)
    }

    /// Notification for a rename from `from` to `to`.
    #[must_use]
    pub fn moved(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Self {
            path_old: from.into(),
            path_new: Some(to.into()),
            kind: WatchEventKind::Moved,
            is_directory: false,
        }
    }

    /// Rename whose origin lies outside the watched tree. The old name is
    /// unknown, so both fields carry the new one.
    #[must_use]
    pub fn moved_in(to: impl Into<PathBuf>) -> Self {
        let to = to.into();
        Self::moved(to.clone(), to)
    }

    /// Mark the notification as concerning a directory.
    #[must_use]
    pub const fn directory(mut self) -> Self {
        self.is_directory = true;
        self
    }

    /// Path that work should be done on: the destination of a move, the
    /// reported path otherwise.
    #[must_use]
    pub fn relevant_path(&self) -> &Path {
        match (self.kind, self.path_new.as_deref()) {
            (WatchEventKind::Moved, Some(path)) => path,
            _ => &self.path_old,
        }
    }

    fn single(path: impl Into<PathBuf>, kind: WatchEventKind) -> Self {
        Self {
            path_old: path.into(),
            path_new: None,
            kind,
            is_directory: false,
        }
    }
}

/// Item crossing the queue from the watch backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchMessage {
    /// A change notification.
    Event(WatchEvent),
    /// The backend reported an error; the stream can no longer be trusted.
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moved_events_resolve_to_their_destination() {
        let event = WatchEvent::moved("/source/.part.tmp", "/source/movie.mkv");
        assert_eq!(event.relevant_path(), Path::new("/source/movie.mkv"));
        assert_eq!(event.path_old, PathBuf::from("/source/.part.tmp"));
    }

    #[test]
    fn other_events_resolve_to_the_reported_path() {
        let event = WatchEvent::created("/source/a.iso");
        assert_eq!(event.relevant_path(), Path::new("/source/a.iso"));
        assert!(!event.is_directory);
        assert!(WatchEvent::created("/source/dir").directory().is_directory);
    }

    #[test]
    fn only_created_and_moved_are_arrivals() {
        assert!(WatchEventKind::Created.is_arrival());
        assert!(WatchEventKind::Moved.is_arrival());
        assert!(!WatchEventKind::Modified.is_arrival());
        assert!(!WatchEventKind::Deleted.is_arrival());
    }
}
