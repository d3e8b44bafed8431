#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

//! Ferry application wiring.
//!
//! Layout: `bootstrap.rs` (boot sequence and signals), `orchestrator.rs`
//! (run modes), `router.rs` (notification handling), `watch.rs` (`notify`
//! adapter), `error.rs` (application errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;
/// Run-mode orchestration.
pub mod orchestrator;
/// Notification routing.
pub mod router;
/// Filesystem watch subscription.
pub mod watch;

pub use bootstrap::{run_app, run_with};
pub use error::{AppError, AppResult};
pub use orchestrator::{Orchestrator, RunExit};
pub use router::{EventRouter, IgnoreReason, RouteOutcome};
pub use watch::SourceWatcher;
