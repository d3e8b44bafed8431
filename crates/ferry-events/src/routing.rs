//! Bounded queue between the watch backend thread and the async router.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{WatchQueueError, WatchQueueResult};
use crate::payloads::WatchMessage;
use crate::topics::message_kind;

/// Stream handed to the router; yields messages in delivery order.
pub type WatchStream = ReceiverStream<WatchMessage>;

/// Producer half owned by the watch backend.
#[derive(Clone, Debug)]
pub struct WatchSender {
    inner: mpsc::Sender<WatchMessage>,
}

impl WatchSender {
    /// Queue a message from a non-async thread, waiting for capacity.
    ///
    /// Must not be called from inside a tokio runtime worker.
    ///
    /// # Errors
    ///
    /// Returns an error once the consuming stream has been dropped.
    pub fn blocking_send(&self, message: WatchMessage) -> WatchQueueResult<()> {
        let kind = message_kind(&message);
        self.inner
            .blocking_send(message)
            .map_err(|_| WatchQueueError::Closed { message_kind: kind })
    }

    /// Queue a message from async code, waiting for capacity.
    ///
    /// # Errors
    ///
    /// Returns an error once the consuming stream has been dropped.
    pub async fn send(&self, message: WatchMessage) -> WatchQueueResult<()> {
        let kind = message_kind(&message);
        self.inner
            .send(message)
            .await
            .map_err(|_| WatchQueueError::Closed { message_kind: kind })
    }
}

/// Create a bounded queue with the given capacity.
#[must_use]
pub fn watch_queue(capacity: usize) -> (WatchSender, WatchStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (WatchSender { inner: tx }, ReceiverStream::new(rx))
}
