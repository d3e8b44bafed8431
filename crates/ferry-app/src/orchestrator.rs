//! Run-mode state machine: bulk pass, watch loop, or both in sequence.

use std::future::Future;
use std::path::PathBuf;

use ferry_config::{RunMode, Settings};
use ferry_events::DEFAULT_QUEUE_CAPACITY;
use ferry_fsops::{FileReplicator, TreeSummary, replicate_tree};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::router::EventRouter;
use crate::watch::SourceWatcher;

/// How a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// The bulk pass finished and the mode does not watch.
    Completed,
    /// A termination signal stopped the watch loop.
    ShutdownRequested {
        /// Name of the signal that was received.
        signal: &'static str,
    },
}

impl RunExit {
    /// Machine-friendly label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Drives the configured run mode to completion.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    mode: RunMode,
    source: PathBuf,
    destination: PathBuf,
    replicator: FileReplicator,
    router: EventRouter,
}

impl Orchestrator {
    /// Build the pipeline from validated settings.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            mode: settings.mode,
            source: settings.source.clone(),
            destination: settings.destination.clone(),
            replicator: FileReplicator::new(settings.replication),
            router: EventRouter::from_settings(settings),
        }
    }

    /// Run until the mode completes, the watch backend fails, or `shutdown`
    /// resolves.
    ///
    /// In [`RunMode::Both`] the bulk pass completes before the subscription
    /// starts, so files arriving during the pass are only picked up if the
    /// walk happens to reach them. `shutdown` is only polled while watching.
    ///
    /// # Errors
    ///
    /// Returns an error when the subscription cannot be established, the
    /// backend fails while watching, or `shutdown` itself fails.
    pub async fn run<F>(self, shutdown: F) -> AppResult<RunExit>
    where
        F: Future<Output = AppResult<&'static str>> + Send,
    {
        info!(mode = %self.mode, "orchestrator starting");
        if self.mode.runs_bulk_pass() {
            self.bulk_pass().await?;
        }
        if !self.mode.watches() {
            return Ok(RunExit::Completed);
        }

        let (watcher, stream) = SourceWatcher::subscribe(&self.source, DEFAULT_QUEUE_CAPACITY)?;
        let exit = tokio::select! {
            result = self.router.run(stream) => result.map(|()| RunExit::Completed),
            signal = shutdown => signal.map(|signal| {
                info!(signal, "termination signal received; stopping watch");
                RunExit::ShutdownRequested { signal }
            }),
        };
        drop(watcher);
        exit
    }

    /// Copy every file currently under the source root.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task running the pass panics.
    pub async fn bulk_pass(&self) -> AppResult<TreeSummary> {
        info!(
            source = %self.source.display(),
            destination = %self.destination.display(),
            "bulk pass starting"
        );
        let replicator = self.replicator;
        let source = self.source.clone();
        let destination = self.destination.clone();
        tokio::task::spawn_blocking(move || replicate_tree(&replicator, &source, &destination))
            .await
            .map_err(|err| AppError::join("bulk_pass", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_config::{LogLevel, ReplicationPolicy, StabilityPolicy};
    use ferry_test_support::fixtures::{ReplicaDirs, write_file};
    use std::error::Error;
    use std::num::NonZeroUsize;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type TestResult<T> = Result<T, Box<dyn Error>>;

    fn settings(dirs: &ReplicaDirs, mode: RunMode) -> Settings {
        Settings {
            log_level: LogLevel::Info,
            log_format: None,
            source: dirs.source.clone(),
            destination: dirs.destination.clone(),
            mode,
            stability: StabilityPolicy {
                timeout: Duration::from_secs(30),
                poll_interval: Duration::from_millis(50),
            },
            replication: ReplicationPolicy::default(),
            workers: NonZeroUsize::MIN,
        }
    }

    #[tokio::test]
    async fn one_shot_copies_the_tree_and_completes() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-orchestrator-")?;
        write_file(&dirs.source, "a.bin", b"a")?;
        write_file(&dirs.source, "deep/er/b.bin", b"b")?;

        let exit = Orchestrator::new(&settings(&dirs, RunMode::OneShot))
            .run(std::future::pending())
            .await?;

        assert_eq!(exit, RunExit::Completed);
        assert!(dirs.destination.join("a.bin").is_file());
        assert!(dirs.destination.join("b.bin").is_file());
        Ok(())
    }

    #[tokio::test]
    async fn bulk_pass_reports_counts() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-orchestrator-")?;
        write_file(&dirs.source, "one.bin", b"1")?;
        write_file(&dirs.source, "x/two.bin", b"2")?;

        let summary = Orchestrator::new(&settings(&dirs, RunMode::OneShot))
            .bulk_pass()
            .await?;

        assert_eq!(summary.copied, 2);
        assert_eq!(summary.failed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn watch_mode_stops_on_shutdown_signal() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-orchestrator-")?;
        write_file(&dirs.source, "preexisting.bin", b"old")?;
        let (trigger, fired) = oneshot::channel::<()>();

        let orchestrator = Orchestrator::new(&settings(&dirs, RunMode::Watch));
        let run = tokio::spawn(orchestrator.run(async move {
            let _ = fired.await;
            Ok::<_, AppError>("SIGTERM")
        }));
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = trigger.send(());

        let exit = run.await??;
        assert_eq!(exit, RunExit::ShutdownRequested { signal: "SIGTERM" });
        assert!(!dirs.destination.join("preexisting.bin").exists());
        Ok(())
    }

    #[tokio::test]
    async fn both_mode_copies_existing_then_new_arrivals() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-orchestrator-")?;
        write_file(&dirs.source, "before.bin", b"before")?;
        let (trigger, fired) = oneshot::channel::<()>();

        let orchestrator = Orchestrator::new(&settings(&dirs, RunMode::Both));
        let run = tokio::spawn(orchestrator.run(async move {
            let _ = fired.await;
            Ok::<_, AppError>("SIGHUP")
        }));

        let before = dirs.destination.join("before.bin");
        for _ in 0..100 {
            if before.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        write_file(&dirs.source, "after.bin", b"after")?;

        let after = dirs.destination.join("after.bin");
        for _ in 0..250 {
            if after.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let _ = trigger.send(());
        let exit = run.await??;

        assert!(before.is_file());
        assert_eq!(std::fs::read(&after)?, b"after");
        assert!(matches!(exit, RunExit::ShutdownRequested { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn watching_a_missing_source_fails() -> TestResult<()> {
        let dirs = ReplicaDirs::new("ferry-orchestrator-")?;
        let mut config = settings(&dirs, RunMode::Watch);
        config.source = dirs.temp.path().join("missing");

        let result = Orchestrator::new(&config)
            .run(std::future::pending())
            .await;

        assert!(matches!(result, Err(AppError::Watch { .. })));
        Ok(())
    }
}
