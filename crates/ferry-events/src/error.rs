//! Watch queue error primitives.

use std::fmt::{self, Display, Formatter};

/// Error emitted when a notification cannot be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchQueueError {
    /// The consuming side of the queue has been dropped.
    Closed {
        /// Kind of the message that could not be delivered.
        message_kind: &'static str,
    },
}

impl WatchQueueError {
    /// Kind of the message that failed delivery.
    #[must_use]
    pub const fn message_kind(&self) -> &'static str {
        match self {
            Self::Closed { message_kind } => message_kind,
        }
    }
}

impl Display for WatchQueueError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("watch queue closed")
    }
}

impl std::error::Error for WatchQueueError {}

/// Result wrapper for queue operations.
pub type WatchQueueResult<T> = Result<T, WatchQueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_error_exposes_fields() {
        let err = WatchQueueError::Closed {
            message_kind: "created",
        };
        assert_eq!(err.message_kind(), "created");
        assert_eq!(err.to_string(), "watch queue closed");
    }
}
