//! Transfer-completion heuristic.
//!
//! A file is considered fully uploaded once two samples taken one poll
//! interval apart report the same size. A producer that pauses for a whole
//! interval mid-upload is therefore reported as stable early; that is a known
//! limitation of the heuristic, not something this module tries to detect.

use std::fs;
use std::io;
use std::path::Path;

use ferry_config::StabilityPolicy;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, trace};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::{StabilityOutcome, TransferState};

/// Waits for files to stop growing, disappear, or exhaust their time budget.
#[derive(Debug, Clone, Copy)]
pub struct StabilityMonitor {
    policy: StabilityPolicy,
}

impl StabilityMonitor {
    /// Monitor using the given timeout and poll interval.
    #[must_use]
    pub const fn new(policy: StabilityPolicy) -> Self {
        Self { policy }
    }

    /// Policy this monitor samples with.
    #[must_use]
    pub const fn policy(&self) -> StabilityPolicy {
        self.policy
    }

    /// Sample `path` until its size settles.
    ///
    /// Each poll checks, in order: the path is still a regular file
    /// (otherwise [`StabilityOutcome::Removed`]), the budget is not exhausted
    /// (otherwise [`StabilityOutcome::TimedOut`]), and the current size
    /// matches the previous sample (then [`StabilityOutcome::Stable`]). A file
    /// that vanishes between the existence check and the size read is
    /// re-polled rather than reported as an error. Nothing is written or
    /// locked.
    ///
    /// # Errors
    ///
    /// Returns an error when reading the size fails for a reason other than
    /// the file no longer existing.
    pub async fn await_stable(&self, path: &Path) -> FsOpsResult<StabilityOutcome> {
        let mut state = TransferState::new(Instant::now());
        debug!(path = %path.display(), "waiting for transfer to finish");

        loop {
            if !path.is_file() {
                info!(path = %path.display(), "file removed while waiting for transfer");
                return Ok(StabilityOutcome::Removed);
            }

            let elapsed = state.started_at.elapsed();
            if elapsed > self.policy.timeout {
                info!(
                    path = %path.display(),
                    elapsed_secs = elapsed.as_secs(),
                    "timeout reached while waiting for transfer"
                );
                return Ok(StabilityOutcome::TimedOut);
            }

            let size = match fs::metadata(path) {
                Ok(metadata) => metadata.len(),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    trace!(path = %path.display(), "file vanished mid-sample; polling again");
                    continue;
                }
                Err(source) => return Err(FsOpsError::io("await_stable.stat", path, source)),
            };

            if state.last_observed_size == Some(size) {
                info!(path = %path.display(), size, "transfer finished");
                return Ok(StabilityOutcome::Stable);
            }

            trace!(
                path = %path.display(),
                size,
                previous = ?state.last_observed_size,
                "size changed; sampling again"
            );
            state.last_observed_size = Some(size);
            sleep(self.policy.poll_interval).await;
        }
    }
}
