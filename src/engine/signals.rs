use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::state::MessageId;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HighlightTarget {
    AssistantIcon,
    NavItem { item: String },
    SearchInput,
    MessageRow { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ViewEvent {
    Highlight {
        target: HighlightTarget,
        duration_ms: u64,
    },
    Navigate {
        route: String,
    },
    Notice {
        level: NoticeLevel,
        text: String,
    },
    Reveal {
        message_id: MessageId,
    },
    SignedOut {
        redirect: String,
    },
}

#[derive(Debug, Clone)]
pub struct ViewSignals {
    sender: broadcast::Sender<ViewEvent>,
}

impl Default for ViewSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSignals {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: ViewEvent) {
        trace!(?event, "view event");
        let _ = self.sender.send(event);
    }

    pub fn highlight(&self, target: HighlightTarget, duration: Duration) {
        self.emit(ViewEvent::Highlight {
            target,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        });
    }

    pub fn info(&self, text: impl Into<String>) {
        self.notice(NoticeLevel::Info, text);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.notice(NoticeLevel::Success, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.notice(NoticeLevel::Error, text);
    }

    fn notice(&self, level: NoticeLevel, text: impl Into<String>) {
        self.emit(ViewEvent::Notice {
            level,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let signals = ViewSignals::new();
        let mut rx = signals.subscribe();

        signals.highlight(HighlightTarget::SearchInput, Duration::from_millis(1000));
        signals.error("boom");

        assert_eq!(
            rx.recv().await.expect("event"),
            ViewEvent::Highlight {
                target: HighlightTarget::SearchInput,
                duration_ms: 1000,
            }
        );
        assert_eq!(
            rx.recv().await.expect("event"),
            ViewEvent::Notice {
                level: NoticeLevel::Error,
                text: "boom".to_string(),
            }
        );
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        ViewSignals::new().info("nobody listening");
    }

    #[test]
    fn events_serialize_with_tags() {
        let value = serde_json::to_value(ViewEvent::Highlight {
            target: HighlightTarget::MessageRow {
                id: "m1".to_string(),
            },
            duration_ms: 1500,
        })
        .expect("serialize");

        assert_eq!(value["event"], "highlight");
        assert_eq!(value["target"]["kind"], "message_row");
        assert_eq!(value["target"]["id"], "m1");
    }
}
