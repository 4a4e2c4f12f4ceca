use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::models::{ChatTurn, Role};

const GREETING: &str = "Hello! I can help you manage your emails. Try asking me to \"compose an email\" or \"find emails from John\".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationState {
    messages: Vec<ChatMessage>,
    busy: bool,
    panel_open: bool,
    next_id: u64,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    /// Starts with the assistant's greeting and the panel open.
    pub fn new() -> Self {
        let mut state = Self::empty();
        state.append(Role::Assistant, GREETING);
        state.panel_open = true;
        state
    }

    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            busy: false,
            panel_open: false,
            next_id: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: MessageId(self.next_id),
            role,
            content: content.into(),
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn toggle_panel(&mut self) {
        self.panel_open = !self.panel_open;
    }

    pub fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
    }

    /// The last `limit` messages as request history, oldest first.
    pub fn history(&self, limit: usize) -> Vec<ChatTurn> {
        let skip = self.messages.len().saturating_sub(limit);
        self.messages
            .iter()
            .skip(skip)
            .map(|message| ChatTurn {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }

    pub fn since(&self, id: MessageId) -> &[ChatMessage] {
        let start = self.messages.partition_point(|message| message.id <= id);
        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_greeting_and_open_panel() {
        let state = ConversationState::new();
        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].role, Role::Assistant);
        assert!(state.is_panel_open());
        assert!(!state.is_busy());
    }

    #[test]
    fn ids_increase_with_each_append() {
        let mut state = ConversationState::empty();
        let first = state.append(Role::User, "hi");
        let second = state.append(Role::Assistant, "hello");
        assert!(first.id < second.id);
        assert_eq!(state.last().map(|m| m.id), Some(second.id));
    }

    #[test]
    fn history_keeps_most_recent_turns() {
        let mut state = ConversationState::empty();
        for n in 0..12 {
            state.append(Role::User, format!("msg {n}"));
        }
        let history = state.history(10);
        assert_eq!(history.len(), 10);
        assert_eq!(history[0].content, "msg 2");
        assert_eq!(history[9].content, "msg 11");
    }

    #[test]
    fn since_returns_later_messages() {
        let mut state = ConversationState::empty();
        let marker = state.append(Role::User, "a");
        state.append(Role::Assistant, "b");
        let later: Vec<_> = state.since(marker.id).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(later, ["b"]);
    }

    #[test]
    fn panel_toggles() {
        let mut state = ConversationState::new();
        state.toggle_panel();
        assert!(!state.is_panel_open());
        state.set_panel_open(true);
        assert!(state.is_panel_open());
    }
}
