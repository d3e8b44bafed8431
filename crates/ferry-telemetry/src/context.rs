//! Span helpers for the process and for individual files.
//!
//! # Design
//! - The `app` span carries mode and build info so every line is attributable.
//! - Per-file spans keep concurrent notifications distinguishable in logs.

use std::path::Path;

use tracing::Span;

use crate::init::build_sha;

/// Process-level span; attach it to the top-level future with
/// [`tracing::Instrument`].
#[must_use]
pub fn app_span(mode: &str) -> Span {
    tracing::info_span!("app", mode = %mode, build_sha = %build_sha())
}

/// Span wrapping the handling of one file from arrival to copy.
#[must_use]
pub fn file_span(path: &Path, origin: &'static str) -> Span {
    tracing::info_span!("file", path = %path.display(), origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Instrument;

    #[tokio::test]
    async fn app_span_wraps_the_process_future() {
        let output = async { 7 }.instrument(app_span("BOTH")).await;
        assert_eq!(output, 7);
    }

    #[tokio::test]
    async fn file_span_wraps_futures() {
        let output = async { "copied" }
            .instrument(file_span(Path::new("/source/a.bin"), "watch"))
            .await;
        assert_eq!(output, "copied");
    }
}
