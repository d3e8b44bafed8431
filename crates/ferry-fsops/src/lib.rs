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

//! Stability detection and copy primitives for arriving files.
//!
//! Layout: `stability.rs` (transfer-completion heuristic), `replicate.rs`
//! (single-file copy with metadata overrides), `walk.rs` (bulk enumeration and
//! the one-shot pass), `model.rs` (outcomes and results), `error.rs`.

pub mod error;
pub mod model;
pub mod replicate;
pub mod stability;
pub mod walk;

pub use error::{FsOpsError, FsOpsResult};
pub use model::{ReplicationResult, StabilityOutcome, TransferState, TreeSummary};
pub use replicate::FileReplicator;
pub use stability::StabilityMonitor;
pub use walk::{FileWalk, replicate_tree, walk_files};
