//! Adapter from `notify` to the ferry notification model.
//!
//! The backend thread translates raw events and pushes them onto the bounded
//! watch queue. Dropping [`SourceWatcher`] unsubscribes; the queue then ends,
//! which the router treats as fatal.
//!
//! A directory that appears in the tree (created, renamed, or moved in) is
//! walked on arrival and one notification is added per regular file inside
//! it. Files created after the backend starts watching the new directory
//! may then be reported twice; copies are idempotent.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use ferry_events::{WatchEvent, WatchEventKind, WatchMessage, WatchStream, watch_queue};
use ferry_fsops::walk_files;
use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

/// Rename trackers remembered while waiting for the matching `Both` event.
const PENDING_RENAME_LIMIT: usize = 256;

/// Live recursive subscription on the source root.
pub struct SourceWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl SourceWatcher {
    /// Start watching `root` recursively.
    ///
    /// Returns the watcher handle and the stream of translated notifications.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Watch`] if the backend cannot be created or the
    /// root cannot be registered.
    pub fn subscribe(root: &Path, capacity: usize) -> AppResult<(Self, WatchStream)> {
        let (sender, stream) = watch_queue(capacity);
        let mut translator = NotifyTranslator::default();

        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                let messages: Vec<WatchMessage> = match result {
                    Ok(event) => translator
                        .translate(&event)
                        .into_iter()
                        .map(WatchMessage::Event)
                        .collect(),
                    Err(err) => vec![WatchMessage::Failed(err.to_string())],
                };
                for message in messages {
                    if let Err(err) = sender.blocking_send(message) {
                        debug!(
                            message_kind = err.message_kind(),
                            "watch queue closed; dropping notification"
                        );
                        return;
                    }
                }
            },
            Config::default(),
        )
        .map_err(|err| AppError::watch("watcher.new", Some(root), err.to_string()))?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|err| AppError::watch("watcher.watch", Some(root), err.to_string()))?;
        info!(root = %root.display(), "watching source tree");

        Ok((
            Self {
                root: root.to_path_buf(),
                _watcher: watcher,
            },
            stream,
        ))
    }

    /// Root this subscription covers.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for SourceWatcher {
    fn drop(&mut self) {
        info!(root = %self.root.display(), "stopped watching source tree");
    }
}

/// Stateful translation of raw backend events.
///
/// Linux reports a rename as `From`, `To`, then `Both` sharing one tracker.
/// Trackers seen on `From` suppress the matching `To` so that each rename is
/// reported once, through `Both`. A `To` without a known tracker is a move
/// into the tree from outside.
#[derive(Debug, Default)]
pub(crate) struct NotifyTranslator {
    pending_renames: VecDeque<usize>,
}

impl NotifyTranslator {
    pub(crate) fn translate(&mut self, event: &Event) -> Vec<WatchEvent> {
        let events = match event.kind {
            EventKind::Create(kind) => map_paths(event, |path| {
                mark_directory(WatchEvent::created(path), path, kind == CreateKind::Folder)
            }),
            EventKind::Modify(ModifyKind::Name(mode)) => self.translate_rename(mode, event),
            EventKind::Modify(_) => map_paths(event, |path| {
                mark_directory(WatchEvent::modified(path), path, false)
            }),
            EventKind::Remove(kind) => map_paths(event, |path| {
                let event = WatchEvent::deleted(path);
                if kind == RemoveKind::Folder {
                    event.directory()
                } else {
                    event
                }
            }),
            EventKind::Access(_) | EventKind::Other | EventKind::Any => Vec::new(),
        };
        expand_directories(events)
    }

    fn translate_rename(&mut self, mode: RenameMode, event: &Event) -> Vec<WatchEvent> {
        let tracker = event.attrs.tracker();
        match mode {
            RenameMode::Both => {
                if let Some(tracker) = tracker {
                    self.pending_renames.retain(|pending| *pending != tracker);
                }
                match event.paths.as_slice() {
                    [from, to, ..] => vec![mark_directory(
                        WatchEvent::moved(from.clone(), to.clone()),
                        to,
                        false,
                    )],
                    _ => {
                        warn!(paths = ?event.paths, "rename event without both names");
                        Vec::new()
                    }
                }
            }
            RenameMode::From => {
                if let Some(tracker) = tracker {
                    self.remember(tracker);
                }
                map_paths(event, |path| WatchEvent::deleted(path.to_path_buf()))
            }
            RenameMode::To => {
                if tracker.is_some_and(|tracker| self.pending_renames.contains(&tracker)) {
                    return Vec::new();
                }
                map_paths(event, |path| {
                    mark_directory(WatchEvent::moved_in(path), path, false)
                })
            }
            RenameMode::Any | RenameMode::Other => map_paths(event, |path| {
                if path.exists() {
                    mark_directory(WatchEvent::moved_in(path), path, false)
                } else {
                    WatchEvent::deleted(path)
                }
            }),
        }
    }

    fn remember(&mut self, tracker: usize) {
        if self.pending_renames.len() == PENDING_RENAME_LIMIT {
            self.pending_renames.pop_front();
        }
        self.pending_renames.push_back(tracker);
    }
}

fn expand_directories(events: Vec<WatchEvent>) -> Vec<WatchEvent> {
    let mut expanded = Vec::with_capacity(events.len());
    for event in events {
        let arrived = event.is_directory
            && matches!(event.kind, WatchEventKind::Created | WatchEventKind::Moved)
            && event.relevant_path().is_dir();
        let contents = if arrived {
            contained_files(&event)
        } else {
            Vec::new()
        };
        expanded.push(event);
        expanded.extend(contents);
    }
    expanded
}

/// Per-file notifications for a directory that just arrived. Moves keep the
/// old name of each file relative to the directory's old name.
fn contained_files(directory: &WatchEvent) -> Vec<WatchEvent> {
    let root = directory.relevant_path();
    let files: Vec<PathBuf> = walk_files(root)
        .filter_map(|entry| {
            entry
                .inspect_err(|err| {
                    warn!(
                        directory = %root.display(),
                        error = %err.detail(),
                        "skipping unreadable entry in arrived directory"
                    );
                })
                .ok()
        })
        .collect();
    debug!(directory = %root.display(), files = files.len(), "expanded arrived directory");

    files
        .into_iter()
        .map(|file| {
            if directory.kind == WatchEventKind::Moved {
                let origin = file
                    .strip_prefix(root)
                    .map_or_else(|_| file.clone(), |relative| directory.path_old.join(relative));
                WatchEvent::moved(origin, file)
            } else {
                WatchEvent::created(file)
            }
        })
        .collect()
}

fn map_paths(event: &Event, build: impl Fn(&Path) -> WatchEvent) -> Vec<WatchEvent> {
    event.paths.iter().map(|path| build(path.as_path())).collect()
}

fn mark_directory(event: WatchEvent, path: &Path, known_directory: bool) -> WatchEvent {
    if known_directory || path.is_dir() {
        event.directory()
    } else {
        event
    }
}
