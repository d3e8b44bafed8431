//! Log labels for queue items.

use crate::payloads::WatchMessage;

/// Machine-friendly discriminator used in log fields.
#[must_use]
pub const fn message_kind(message: &WatchMessage) -> &'static str {
    match message {
        WatchMessage::Event(event) => event.kind.as_str(),
        WatchMessage::Failed(_) => "watch_failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::WatchEvent;

    #[test]
    fn message_kind_matches_payload() {
        assert_eq!(
            message_kind(&WatchMessage::Event(WatchEvent::moved("/a", "/b"))),
            "moved"
        );
        assert_eq!(
            message_kind(&WatchMessage::Failed("inotify".into())),
            "watch_failed"
        );
    }
}
