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

//! Environment-backed configuration for the ferry replicator.
//!
//! Layout: `model.rs` (typed settings), `validate.rs` (value parsers and
//! filesystem preconditions), `loader.rs` (environment lookup), `defaults.rs`
//! (fallback values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::STABILITY_POLL_INTERVAL;
pub use error::{ConfigError, ConfigResult};
pub use model::{LogLevel, Ownership, ReplicationPolicy, RunMode, Settings, StabilityPolicy};
