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

//! Filesystem change notifications and the queue that carries them.
//!
//! The watch backend runs on its own thread and pushes [`WatchMessage`]s into
//! a bounded queue; the router consumes them in delivery order as a stream.
//!
//! Layout: `payloads.rs` (notification types), `routing.rs` (queue halves),
//! `topics.rs` (log labels), `error.rs` (queue errors).

pub mod error;
pub mod payloads;
pub mod routing;
pub mod topics;

pub use error::{WatchQueueError, WatchQueueResult};
pub use payloads::{DEFAULT_QUEUE_CAPACITY, WatchEvent, WatchEventKind, WatchMessage};
pub use routing::{WatchSender, WatchStream, watch_queue};
pub use topics::message_kind;
