use tracing::{debug, info, warn};

use crate::api::models::{Message, Profile};
use crate::error::AppResult;

use super::Engine;

impl Engine {
    /// Returns whether the page was applied.
    pub async fn refresh(&self) -> bool {
        let page_size = self.config.page_size;
        let (ticket, request) = self
            .mailbox
            .update(|state| (state.begin_fetch(), state.list_request(page_size)));

        match self.mail.list_messages(&request).await {
            Ok(page) => {
                let count = page.messages.len();
                let applied = self.mailbox.update(|state| {
                    let applied = state.apply_page(ticket, page);
                    state.finish_fetch(ticket);
                    applied
                });
                if applied {
                    debug!(count, "page loaded");
                } else {
                    debug!(count, "discarding stale page");
                }
                applied
            }
            Err(err) => {
                warn!(error = %err, "listing failed");
                self.mailbox.update(|state| state.finish_fetch(ticket));
                self.signals.error(format!("Failed to load emails: {err}"));
                false
            }
        }
    }

    pub async fn next_page(&self) -> bool {
        if !self.mailbox.update(|state| state.next_page()) {
            return false;
        }
        self.refresh().await
    }

    pub async fn prev_page(&self) -> bool {
        if !self.mailbox.update(|state| state.prev_page()) {
            return false;
        }
        self.refresh().await
    }

    pub fn open_message(&self, id: &str) -> bool {
        let Some(was_unread) = self.mailbox.update(|state| {
            state.message(id)?;
            let was_unread = state.mark_read(id);
            state.select(Some(id.to_string()));
            Some(was_unread)
        }) else {
            return false;
        };

        if was_unread {
            let mail = self.mail.clone();
            let ids = vec![id.to_string()];
            tokio::spawn(async move {
                if let Err(err) = mail.mark_read(&ids).await {
                    warn!(id = %ids[0], error = %err, "remote mark-read failed");
                }
            });
        }
        true
    }

    /// Fetches a thread for the detail view. Failures become an error notice.
    pub async fn load_thread(&self, thread_id: &str) -> Option<Vec<Message>> {
        match self.mail.fetch_thread(thread_id).await {
            Ok(messages) => {
                debug!(thread_id, count = messages.len(), "thread loaded");
                Some(messages)
            }
            Err(err) => {
                warn!(thread_id, error = %err, "thread fetch failed");
                self.signals.error(format!("Failed to load the thread: {err}"));
                None
            }
        }
    }

    pub async fn trash(&self, id: &str) -> bool {
        let Some((index, message)) = self.mailbox.update(|state| state.remove_message(id)) else {
            self.signals.error("Could not find that email.");
            return false;
        };

        match self.mail.trash_message(id).await {
            Ok(()) => {
                info!(id, "moved to trash");
                self.signals.success("Email moved to trash");
                true
            }
            Err(err) => {
                warn!(id, error = %err, "trash failed");
                self.mailbox
                    .update(|state| state.restore_message(index, message));
                self.signals.error("Failed to move email to trash.");
                false
            }
        }
    }

    pub async fn load_profile(&self) -> AppResult<Profile> {
        let profile = self.mail.get_profile().await?;
        self.mailbox
            .update(|state| state.set_profile(Some(profile.clone())));
        Ok(profile)
    }
}
