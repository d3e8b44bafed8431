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

//! Binary entrypoint: replicates finished uploads from the source tree into
//! the destination directory.

use ferry_app::{AppResult, run_app};

/// Runs ferry until the mode completes or a termination signal arrives.
#[tokio::main]
async fn main() -> AppResult<()> {
    run_app().await
}
