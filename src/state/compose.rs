use std::fmt;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::api::models::Draft;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeField {
    To,
    Subject,
    Body,
}

impl fmt::Display for ComposeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComposeField::To => "to",
            ComposeField::Subject => "subject",
            ComposeField::Body => "body",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposePhase {
    Closed,
    Editing,
    Minimized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyContext {
    pub source_message_id: String,
    pub thread_id: String,
}

// Each opening of a closed panel gets a fresh instance and token; close
// cancels the token.
#[derive(Debug, Clone)]
pub struct PanelHandle {
    pub instance: u64,
    pub cancel: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct ComposeState {
    is_open: bool,
    is_minimized: bool,
    to: String,
    subject: String,
    body: String,
    reply_context: Option<ReplyContext>,
    panel: Option<PanelHandle>,
    instances_opened: u64,
}

impl PartialEq for ComposeState {
    fn eq(&self, other: &Self) -> bool {
        self.is_open == other.is_open
            && self.is_minimized == other.is_minimized
            && self.to == other.to
            && self.subject == other.subject
            && self.body == other.body
            && self.reply_context == other.reply_context
            && self.panel_instance() == other.panel_instance()
            && self.instances_opened == other.instances_opened
    }
}

impl ComposeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ComposePhase {
        match (self.is_open, self.is_minimized) {
            (false, _) => ComposePhase::Closed,
            (true, false) => ComposePhase::Editing,
            (true, true) => ComposePhase::Minimized,
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_minimized(&self) -> bool {
        self.is_minimized
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn field(&self, field: ComposeField) -> &str {
        match field {
            ComposeField::To => &self.to,
            ComposeField::Subject => &self.subject,
            ComposeField::Body => &self.body,
        }
    }

    pub fn reply_context(&self) -> Option<&ReplyContext> {
        self.reply_context.as_ref()
    }

    pub fn panel(&self) -> Option<PanelHandle> {
        self.panel.clone()
    }

    pub fn panel_instance(&self) -> Option<u64> {
        self.panel.as_ref().map(|panel| panel.instance)
    }

    pub fn open(&mut self) {
        if self.panel.is_none() {
            self.instances_opened += 1;
            self.panel = Some(PanelHandle {
                instance: self.instances_opened,
                cancel: CancellationToken::new(),
            });
        }
        self.is_open = true;
        self.is_minimized = false;
    }

    pub fn close(&mut self) {
        if let Some(panel) = self.panel.take() {
            panel.cancel.cancel();
        }
        self.is_open = false;
        self.is_minimized = false;
    }

    pub fn toggle_minimize(&mut self) {
        if self.is_open {
            self.is_minimized = !self.is_minimized;
        }
    }

    pub fn set_field(&mut self, field: ComposeField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ComposeField::To => self.to = value,
            ComposeField::Subject => self.subject = value,
            ComposeField::Body => self.body = value,
        }
    }

    /// Refused once panel `instance` has been closed.
    pub fn write_from_panel(&mut self, instance: u64, field: ComposeField, value: &str) -> bool {
        if self.panel_instance() != Some(instance) {
            return false;
        }
        self.set_field(field, value);
        true
    }

    pub fn set_reply_context(&mut self, source_message_id: &str, thread_id: &str) {
        let source_message_id = source_message_id.trim();
        let thread_id = thread_id.trim();

        self.reply_context = if source_message_id.is_empty() || thread_id.is_empty() {
            None
        } else {
            Some(ReplyContext {
                source_message_id: source_message_id.to_string(),
                thread_id: thread_id.to_string(),
            })
        };
    }

    /// Clears fields and reply linkage. Visibility is left alone.
    pub fn reset(&mut self) {
        self.to.clear();
        self.subject.clear();
        self.body.clear();
        self.reply_context = None;
    }

    pub fn draft(&self) -> Draft {
        Draft {
            to: self.to.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            thread_id: self
                .reply_context
                .as_ref()
                .map(|context| context.thread_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_open_and_minimize() {
        let mut state = ComposeState::new();
        assert_eq!(state.phase(), ComposePhase::Closed);

        state.toggle_minimize();
        assert_eq!(state.phase(), ComposePhase::Closed);

        state.open();
        assert_eq!(state.phase(), ComposePhase::Editing);
        state.toggle_minimize();
        assert_eq!(state.phase(), ComposePhase::Minimized);
        state.open();
        assert_eq!(state.phase(), ComposePhase::Editing);

        state.toggle_minimize();
        state.close();
        assert_eq!(state.phase(), ComposePhase::Closed);
        assert!(!state.is_minimized());
    }

    #[test]
    fn reopening_starts_a_new_panel_instance() {
        let mut state = ComposeState::new();
        state.open();
        let first = state.panel().expect("panel open");
        state.open();
        assert_eq!(state.panel_instance(), Some(first.instance));

        state.close();
        assert!(first.cancel.is_cancelled());
        assert_eq!(state.panel_instance(), None);

        state.open();
        assert_ne!(state.panel_instance(), Some(first.instance));
    }

    #[test]
    fn writes_from_a_closed_panel_are_refused() {
        let mut state = ComposeState::new();
        state.open();
        let instance = state.panel_instance().expect("panel open");
        assert!(state.write_from_panel(instance, ComposeField::To, "a"));

        state.close();
        state.open();
        assert!(!state.write_from_panel(instance, ComposeField::To, "ab"));
        assert_eq!(state.to(), "a");
    }

    #[test]
    fn reply_context_needs_both_ids() {
        let mut state = ComposeState::new();
        state.set_reply_context("m1", "");
        assert!(state.reply_context().is_none());

        state.set_reply_context("m1", "t1");
        assert_eq!(state.draft().thread_id.as_deref(), Some("t1"));
    }

    #[test]
    fn reset_keeps_visibility() {
        let mut state = ComposeState::new();
        state.open();
        state.set_field(ComposeField::Body, "hello");
        state.set_reply_context("m1", "t1");

        state.reset();

        assert!(state.is_open());
        assert_eq!(state.body(), "");
        assert!(state.reply_context().is_none());
    }
}
