use tracing::{debug, warn};

use crate::api::models::{AssistantContext, CurrentEmail, EmailSummary, Role};

use super::signals::ViewEvent;
use super::{Engine, Outcome, pause};

const HISTORY_LIMIT: usize = 10;
const CONTEXT_EMAILS: usize = 20;
const DEFAULT_USER_NAME: &str = "User";
const EMPTY_REPLY: &str = "I processed that, but have nothing to say.";
const ASSISTANT_FAILURE: &str = "Sorry, I encountered an error. Please try again.";

impl Engine {
    /// `None` while a previous message is still being answered.
    pub async fn ask(&self, text: &str) -> Option<Outcome> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let history = self.conversation.update(|state| {
            if state.is_busy() {
                return None;
            }
            let history = state.history(HISTORY_LIMIT);
            state.append(Role::User, text);
            state.set_busy(true);
            Some(history)
        })?;

        let context = self.assistant_context();
        let response = self.assistant.respond(text, &history, &context).await;
        self.conversation.update(|state| state.set_busy(false));

        let reply = match response {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "assistant request failed");
                self.say(ASSISTANT_FAILURE);
                return Some(Outcome::Aborted);
            }
        };

        match reply.message.filter(|message| !message.trim().is_empty()) {
            Some(message) => {
                let stored = self
                    .conversation
                    .update(|state| state.append(Role::Assistant, message));
                self.signals.emit(ViewEvent::Reveal {
                    message_id: stored.id,
                });
            }
            None if reply.action.is_none() => self.say(EMPTY_REPLY),
            None => {}
        }

        let Some(action) = reply.action else {
            return Some(Outcome::Completed);
        };

        debug!(?action, "assistant returned an action");
        pause(self.config.pacing.assistant_settle).await;
        Some(self.dispatch(action).await)
    }

    pub fn assistant_context(&self) -> AssistantContext {
        let user_name = self
            .config
            .user_name
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());

        self.mailbox.read(|state| AssistantContext {
            current_view: state.view().as_str().to_string(),
            current_email: state.selected().map(CurrentEmail::from),
            emails: state
                .messages()
                .iter()
                .take(CONTEXT_EMAILS)
                .map(EmailSummary::from)
                .collect(),
            user_name: Some(user_name),
            user_email: state
                .profile()
                .map(|profile| profile.email_address.clone()),
        })
    }
}
