//! Routes watch notifications through the stability wait and into a copy.
//!
//! Only arrivals (creations and moves into place) are considered new work.
//! A file that times out or disappears before settling is skipped and not
//! retried; the operator has to resubmit it.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ferry_config::Settings;
use ferry_events::{WatchEvent, WatchEventKind, WatchMessage, WatchStream};
use ferry_fsops::{FileReplicator, ReplicationResult, StabilityMonitor, StabilityOutcome};
use ferry_telemetry::file_span;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_stream::StreamExt;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{AppError, AppResult};

/// Why a notification produced no work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The notification concerned a directory.
    Directory,
    /// The kind never introduces new files.
    Kind(WatchEventKind),
}

/// What happened to one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Filtered out before any filesystem access.
    Ignored(IgnoreReason),
    /// The file never settled; no copy was attempted.
    Skipped {
        /// File that was waited on.
        path: PathBuf,
        /// Why waiting stopped.
        outcome: StabilityOutcome,
    },
    /// A copy was attempted; see the result for success.
    Replicated(ReplicationResult),
    /// Waiting failed with an unexpected IO error.
    Failed {
        /// File that was waited on.
        path: PathBuf,
        /// Rendered error.
        reason: String,
    },
}

impl RouteOutcome {
    /// Whether the notification ended with a successful copy.
    #[must_use]
    pub const fn copied(&self) -> bool {
        matches!(self, Self::Replicated(result) if result.succeeded)
    }
}

/// Consumes notifications in delivery order and drives each to completion.
#[derive(Debug, Clone)]
pub struct EventRouter {
    monitor: StabilityMonitor,
    replicator: FileReplicator,
    destination: PathBuf,
    workers: NonZeroUsize,
}

impl EventRouter {
    /// Router that copies stable arrivals into `destination`.
    ///
    /// With one worker, notifications are handled strictly one after the
    /// other and a slow upload delays everything queued behind it. More
    /// workers admit notifications in order but let their waits overlap.
    #[must_use]
    pub const fn new(
        monitor: StabilityMonitor,
        replicator: FileReplicator,
        destination: PathBuf,
        workers: NonZeroUsize,
    ) -> Self {
        Self {
            monitor,
            replicator,
            destination,
            workers,
        }
    }

    /// Router configured from the process settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            StabilityMonitor::new(settings.stability),
            FileReplicator::new(settings.replication),
            settings.destination.clone(),
            settings.workers,
        )
    }

    /// Handle a single notification.
    pub async fn route(&self, event: &WatchEvent) -> RouteOutcome {
        if event.is_directory {
            debug!(path = %event.relevant_path().display(), "ignoring directory notification");
            return RouteOutcome::Ignored(IgnoreReason::Directory);
        }
        if !event.kind.is_arrival() {
            debug!(
                path = %event.relevant_path().display(),
                kind = event.kind.as_str(),
                "ignoring notification kind"
            );
            return RouteOutcome::Ignored(IgnoreReason::Kind(event.kind));
        }

        let path = event.relevant_path();
        match self.monitor.await_stable(path).await {
            Ok(StabilityOutcome::Stable) => RouteOutcome::Replicated(self.replicate(path).await),
            Ok(outcome) => {
                warn!(
                    path = %path.display(),
                    outcome = outcome.as_str(),
                    "file did not settle; skipping copy"
                );
                RouteOutcome::Skipped {
                    path: path.to_path_buf(),
                    outcome,
                }
            }
            Err(err) => {
                let reason = err.detail();
                error!(path = %path.display(), error = %reason, "stability check failed");
                RouteOutcome::Failed {
                    path: path.to_path_buf(),
                    reason,
                }
            }
        }
    }

    /// Consume the stream until the watch backend fails or goes away.
    ///
    /// Notifications already accepted are routed to completion before the
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Watch`] when the backend reports a failure and
    /// [`AppError::WatchChannelClosed`] when the stream ends; no further
    /// notifications can be trusted in either case.
    pub async fn run(self, stream: WatchStream) -> AppResult<()> {
        if self.workers.get() == 1 {
            self.run_sequential(stream).await
        } else {
            self.run_pooled(stream).await
        }
    }

    async fn run_sequential(&self, mut stream: WatchStream) -> AppResult<()> {
        while let Some(message) = stream.next().await {
            let event = admit(message)?;
            let span = file_span(event.relevant_path(), "watch");
            self.route(&event).instrument(span).await;
        }
        Err(AppError::WatchChannelClosed)
    }

    async fn run_pooled(self, mut stream: WatchStream) -> AppResult<()> {
        let permits = Arc::new(Semaphore::new(self.workers.get()));
        let mut tasks = JoinSet::new();

        let stopped = loop {
            let Some(message) = stream.next().await else {
                break AppError::WatchChannelClosed;
            };
            let event = match admit(message) {
                Ok(event) => event,
                Err(err) => break err,
            };
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break AppError::WatchChannelClosed;
            };
            while let Some(joined) = tasks.try_join_next() {
                log_finished(joined);
            }

            let router = self.clone();
            let span = file_span(event.relevant_path(), "watch");
            tasks.spawn(
                async move {
                    let _permit = permit;
                    router.route(&event).await
                }
                .instrument(span),
            );
        };

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "draining in-flight notifications");
        }
        while let Some(joined) = tasks.join_next().await {
            log_finished(joined);
        }
        Err(stopped)
    }

    async fn replicate(&self, path: &Path) -> ReplicationResult {
        let replicator = self.replicator;
        let source = path.to_path_buf();
        let destination = self.destination.clone();
        let copy = tokio::task::spawn_blocking(move || replicator.copy(&source, &destination));
        match copy.await {
            Ok(result) => result,
            Err(err) => {
                error!(path = %path.display(), error = %err, "copy task failed");
                ReplicationResult::failed(
                    path.to_path_buf(),
                    self.destination.clone(),
                    format!("replicate.join: {err}"),
                )
            }
        }
    }
}

fn log_finished(joined: Result<RouteOutcome, JoinError>) {
    match joined {
        Ok(outcome) => debug!(copied = outcome.copied(), "notification task finished"),
        Err(err) => error!(error = %err, "notification task failed"),
    }
}

fn admit(message: WatchMessage) -> AppResult<WatchEvent> {
    match message {
        WatchMessage::Event(event) => {
            info!(
                path = %event.relevant_path().display(),
                kind = event.kind.as_str(),
                directory = event.is_directory,
                "notification received"
            );
            Ok(event)
        }
        WatchMessage::Failed(detail) => {
            error!(error = %detail, "watch backend failed");
            Err(AppError::watch("watch.stream", None, detail))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_config::{Ownership, ReplicationPolicy, StabilityPolicy};
    use ferry_events::watch_queue;
    use ferry_test_support::fixtures::{ReplicaDirs, append_bytes, write_file};
    use std::error::Error;
    use std::time::Duration;
    use tokio::time::{Instant, sleep};

    type TestResult<T> = Result<T, Box<dyn Error>>;

    const INTERVAL: Duration = Duration::from_secs(2);

    fn router(destination: &Path, timeout: Duration, workers: usize) -> EventRouter {
        EventRouter::new(
            StabilityMonitor::new(StabilityPolicy {
                timeout,
                poll_interval: INTERVAL,
            }),
            FileReplicator::new(ReplicationPolicy {
                file_mode: None,
                ownership: Ownership::default(),
            }),
            destination.to_path_buf(),
            NonZeroUsize::new(workers).unwrap_or(NonZeroUsize::MIN),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_write_is_copied_after_one_interval() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let source = write_file(&dirs.source, "blob.bin", &[1u8; 1024])?;
        let started = Instant::now();

        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::created(&source))
            .await;

        assert!(outcome.copied(), "{outcome:?}");
        assert!(started.elapsed() <= INTERVAL);
        assert_eq!(std::fs::metadata(dirs.destination.join("blob.bin"))?.len(), 1024);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn modified_events_never_copy() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let source = write_file(&dirs.source, "existing.bin", b"data")?;

        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::modified(&source))
            .await;

        assert_eq!(
            outcome,
            RouteOutcome::Ignored(IgnoreReason::Kind(WatchEventKind::Modified))
        );
        assert!(!dirs.destination.join("existing.bin").exists());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_events_are_ignored() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::deleted(dirs.source.join("gone.bin")))
            .await;
        assert_eq!(
            outcome,
            RouteOutcome::Ignored(IgnoreReason::Kind(WatchEventKind::Deleted))
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn directory_events_never_copy() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let nested = dirs.source.join("season-1");
        std::fs::create_dir(&nested)?;

        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::created(&nested).directory())
            .await;

        assert_eq!(outcome, RouteOutcome::Ignored(IgnoreReason::Directory));
        assert_eq!(std::fs::read_dir(&dirs.destination)?.count(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn moves_copy_the_new_name() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let old = dirs.source.join(".movie.mkv.part");
        let new = write_file(&dirs.source, "movie.mkv", b"frames")?;

        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::moved(&old, &new))
            .await;

        let RouteOutcome::Replicated(result) = outcome else {
            panic!("expected a copy, got {outcome:?}");
        };
        assert!(result.succeeded);
        assert_eq!(result.source_path, new);
        assert!(dirs.destination.join("movie.mkv").exists());
        assert!(!dirs.destination.join(".movie.mkv.part").exists());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn file_removed_before_settling_is_skipped() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let source = write_file(&dirs.source, "partial.bin", b"x")?;

        let writer_path = source.clone();
        let writer = tokio::spawn(async move {
            sleep(Duration::from_secs(1)).await;
            append_bytes(&writer_path, b"more")?;
            sleep(Duration::from_secs(2)).await;
            std::fs::remove_file(&writer_path)
        });

        let outcome = router(&dirs.destination, Duration::from_secs(60), 1)
            .route(&WatchEvent::created(&source))
            .await;
        writer.await??;

        assert_eq!(
            outcome,
            RouteOutcome::Skipped {
                path: source,
                outcome: StabilityOutcome::Removed,
            }
        );
        assert_eq!(std::fs::read_dir(&dirs.destination)?.count(), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_is_fatal() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let (sender, stream) = watch_queue(4);
        sender
            .send(WatchMessage::Failed("inotify queue overflow".to_string()))
            .await?;

        let result = router(&dirs.destination, Duration::from_secs(60), 1)
            .run(stream)
            .await;

        assert!(matches!(result, Err(AppError::Watch { .. })));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn end_of_stream_is_fatal_after_draining() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let source = write_file(&dirs.source, "last.bin", b"final")?;
        let (sender, stream) = watch_queue(4);
        sender
            .send(WatchMessage::Event(WatchEvent::created(&source)))
            .await?;
        drop(sender);

        let result = router(&dirs.destination, Duration::from_secs(60), 1)
            .run(stream)
            .await;

        assert!(matches!(result, Err(AppError::WatchChannelClosed)));
        assert!(dirs.destination.join("last.bin").exists());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pooled_end_of_stream_waits_for_in_flight_copies() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let (sender, stream) = watch_queue(8);
        for name in ["first.bin", "second.bin", "third.bin"] {
            let path = write_file(&dirs.source, name, name.as_bytes())?;
            sender.send(WatchMessage::Event(WatchEvent::created(path))).await?;
        }
        drop(sender);

        let result = router(&dirs.destination, Duration::from_secs(60), 2)
            .run(stream)
            .await;

        assert!(matches!(result, Err(AppError::WatchChannelClosed)));
        for name in ["first.bin", "second.bin", "third.bin"] {
            assert_eq!(std::fs::read(dirs.destination.join(name))?, name.as_bytes());
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pooled_backend_failure_still_finishes_queued_copies() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let source = write_file(&dirs.source, "queued.bin", b"queued")?;
        let (sender, stream) = watch_queue(4);
        sender
            .send(WatchMessage::Event(WatchEvent::created(&source)))
            .await?;
        sender
            .send(WatchMessage::Failed("inotify queue overflow".to_string()))
            .await?;

        let result = router(&dirs.destination, Duration::from_secs(60), 2)
            .run(stream)
            .await;

        assert!(matches!(result, Err(AppError::Watch { .. })));
        assert!(dirs.destination.join("queued.bin").exists());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn pooled_workers_overlap_stability_waits() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-router-")?;
        let (sender, stream) = watch_queue(8);
        for name in ["a.bin", "b.bin", "c.bin"] {
            let path = write_file(&dirs.source, name, name.as_bytes())?;
            sender.send(WatchMessage::Event(WatchEvent::created(path))).await?;
        }

        let handle = tokio::spawn(
            router(&dirs.destination, Duration::from_secs(60), 3).run(stream),
        );
        sleep(INTERVAL + Duration::from_millis(100)).await;
        for _ in 0..50 {
            if std::fs::read_dir(&dirs.destination)?.count() == 3 {
                break;
            }
            tokio::task::yield_now().await;
            sleep(Duration::from_millis(10)).await;
        }

        assert!(dirs.destination.join("a.bin").exists());
        assert!(dirs.destination.join("b.bin").exists());
        assert!(dirs.destination.join("c.bin").exists());
        drop(sender);
        assert!(matches!(handle.await?, Err(AppError::WatchChannelClosed)));
        Ok(())
    }
}
