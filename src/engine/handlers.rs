use tracing::{debug, info, warn};

use crate::api::models::{AssistantContext, Draft, EmailSummary};
use crate::state::{ComposeState, FilterPatch};

use super::reply::{reply_address, reply_subject};
use super::signals::{HighlightTarget, ViewEvent};
use super::typing::{self, FillOutcome};
use super::{Action, Engine, FLASH, NavTarget, Outcome, pause, search};

const SIGNED_OUT_ROUTE: &str = "/";
const SEARCH_RESULTS_VIEW: &str = "search_results";

impl Engine {
    pub(super) async fn compose_new(&self, to: &str, subject: &str, body: &str) -> Outcome {
        self.signals.highlight(
            HighlightTarget::NavItem {
                item: NavTarget::Compose.as_str().to_string(),
            },
            FLASH,
        );
        self.compose.update(|state| {
            state.reset();
            state.open();
        });
        pause(self.config.pacing.compose_settle).await;

        if self.fill(to, subject, body).await == FillOutcome::Cancelled {
            return Outcome::Aborted;
        }

        self.signals.success(format!("Composing email to {to}"));
        Outcome::Completed
    }

    pub(super) async fn reply(&self, email_id: &str, body: &str) -> Outcome {
        let Some(source) = self
            .mailbox
            .read(|state| state.message(email_id).cloned())
        else {
            debug!(email_id, "reply target not in mailbox");
            self.signals.error("Could not find the email to reply to.");
            return Outcome::Aborted;
        };

        let to = reply_address(&source.from);
        let subject = reply_subject(&source.subject);

        self.compose.update(|state| {
            state.open();
            state.set_reply_context(&source.id, &source.thread_id);
        });
        pause(self.config.pacing.reply_settle).await;

        if self.fill(&to, &subject, body).await == FillOutcome::Cancelled {
            return Outcome::Aborted;
        }

        self.signals
            .success(format!("Replying to {}", source.from));
        Outcome::Completed
    }

    pub(super) async fn navigate(&self, target: NavTarget) -> Outcome {
        self.mailbox.update(|state| state.select(None));
        self.signals.highlight(
            HighlightTarget::NavItem {
                item: target.as_str().to_string(),
            },
            FLASH,
        );

        match target.view() {
            None => self.compose.update(ComposeState::open),
            Some(view) => {
                self.mailbox.update(|state| state.set_view(view));
                pause(self.config.pacing.navigate).await;
                self.signals.emit(ViewEvent::Navigate {
                    route: view.route(),
                });
            }
        }

        self.signals
            .info(format!("Navigated to {}", target.as_str()));
        Outcome::Completed
    }

    pub(super) fn filter(&self, filters: Option<FilterPatch>) -> Outcome {
        if let Some(patch) = filters {
            self.apply_filter_patch(patch);
        }
        self.signals.info("Filters applied");
        Outcome::Completed
    }

    pub(super) fn search(&self, query: String, filters: Option<FilterPatch>) -> Outcome {
        self.signals
            .highlight(HighlightTarget::SearchInput, FLASH);

        let patch = FilterPatch {
            query: Some(query.clone()),
            ..filters.unwrap_or_default()
        };
        self.apply_filter_patch(patch);

        self.signals.info(format!("Searching for: {query}"));
        Outcome::Completed
    }

    pub(super) fn clear_filters(&self) -> Outcome {
        self.mailbox.update(|state| state.clear_filters());
        self.signals.info("Filters cleared");
        Outcome::Completed
    }

    pub(super) async fn gmail_search(&self, query: &str, depth: usize) -> Outcome {
        self.signals
            .info(format!("Searching your mailbox for: \"{query}\""));
        self.conversation.update(|state| state.set_busy(true));

        let outcome = self.run_gmail_search(query, depth).await;

        self.conversation.update(|state| state.set_busy(false));
        outcome
    }

    async fn run_gmail_search(&self, query: &str, depth: usize) -> Outcome {
        let ticket = self.mailbox.update(|state| state.begin_fetch());

        let results = match self
            .mail
            .search_mailbox(query, self.config.search_max_results)
            .await
        {
            Ok(results) => results,
            Err(err) => {
                warn!(query, error = %err, "mailbox search failed");
                self.mailbox.update(|state| state.finish_fetch(ticket));
                self.say("Sorry, the Gmail search failed. Please try again.");
                return Outcome::Aborted;
            }
        };

        if results.is_empty() {
            self.mailbox.update(|state| state.finish_fetch(ticket));
            self.say(search::no_results_message(query));
            return Outcome::Completed;
        }

        let applied = self.mailbox.update(|state| {
            let applied = state.apply_search_results(ticket, results.clone());
            state.finish_fetch(ticket);
            applied
        });
        if !applied {
            debug!(query, "search results superseded by a newer fetch");
            return Outcome::Completed;
        }

        let bounds = search::date_bounds(query);
        if !bounds.is_empty() {
            self.mailbox
                .update(|state| state.set_date_range(bounds.from, bounds.to));
        }

        let context = AssistantContext {
            current_view: SEARCH_RESULTS_VIEW.to_string(),
            emails: results.iter().take(5).map(EmailSummary::from).collect(),
            ..AssistantContext::default()
        };
        let prompt = search::follow_up_prompt(query, &results);

        let reply = match self.assistant.respond(&prompt, &[], &context).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(query, error = %err, "search summary request failed");
                self.say("Sorry, the Gmail search failed. Please try again.");
                return Outcome::Aborted;
            }
        };

        let summary = reply
            .message
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| search::fallback_summary(query, results.len()));
        self.say(summary);

        if let Some(follow_up) = reply.action {
            pause(self.config.pacing.chain).await;
            return match Action::from_value(follow_up) {
                Ok(action) => self.execute_at(action, depth + 1).await,
                Err(err) => {
                    warn!(error = %err, "dropping chained action");
                    Outcome::Completed
                }
            };
        }

        Outcome::Completed
    }

    pub(super) async fn open_email(&self, email_id: &str) -> Outcome {
        if self.mailbox.read(|state| state.message(email_id).is_none()) {
            debug!(email_id, "open target not in mailbox");
            self.signals.error("Could not find that email.");
            return Outcome::Aborted;
        }

        let pacing = &self.config.pacing;
        pause(pacing.highlight_lead).await;
        self.signals.highlight(
            HighlightTarget::MessageRow {
                id: email_id.to_string(),
            },
            pacing.highlight_duration,
        );
        pause(pacing.open_email.saturating_sub(pacing.highlight_lead)).await;

        self.mailbox
            .update(|state| state.select(Some(email_id.to_string())));
        self.signals.info("Opening email");
        Outcome::Completed
    }

    pub(super) async fn send(&self) -> Outcome {
        let (draft, reply_context) = self.compose.read(|state| {
            (state.draft(), state.reply_context().cloned())
        });

        if draft.to.trim().is_empty() {
            self.signals
                .error("No recipient specified. Please compose an email first.");
            return Outcome::Aborted;
        }

        let (result, success) = match &reply_context {
            Some(context) => (
                self.mail
                    .reply_to_message(&draft, &context.source_message_id, &context.thread_id)
                    .await,
                "Reply sent!",
            ),
            None => (
                self.mail.send_message(&draft).await,
                "Email sent successfully!",
            ),
        };

        match result {
            Ok(receipt) => {
                info!(id = %receipt.id, reply = reply_context.is_some(), "message sent");
                self.close_compose();
                self.signals.success(success);
                Outcome::Completed
            }
            Err(err) => {
                warn!(error = %err, "send failed");
                self.signals
                    .error("Failed to send email. Please try again.");
                Outcome::Aborted
            }
        }
    }

    pub(super) async fn save_draft(&self) -> Outcome {
        let draft = self.compose.read(ComposeState::draft);
        if draft.is_blank() {
            self.signals.error("Nothing to save as draft.");
            return Outcome::Aborted;
        }

        if !self.store_draft(&draft).await {
            self.signals
                .error("Failed to save draft. Please try again.");
            return Outcome::Aborted;
        }

        self.close_compose();
        self.signals.success("Draft saved!");
        Outcome::Completed
    }

    pub(super) async fn logout(&self) -> Outcome {
        self.signals.highlight(
            HighlightTarget::NavItem {
                item: "logout".to_string(),
            },
            FLASH,
        );
        self.signals.info("Logging out...");
        pause(self.config.pacing.logout).await;

        if let Err(err) = self.session.terminate_session().await {
            warn!(error = %err, "session termination failed");
            self.signals.error("Logout failed");
        }

        self.signals.emit(ViewEvent::SignedOut {
            redirect: SIGNED_OUT_ROUTE.to_string(),
        });
        Outcome::Completed
    }

    pub(super) async fn discard_compose(&self, needs_confirmation: bool, save_draft: bool) -> Outcome {
        if needs_confirmation {
            self.say("Do you want to save this draft before discarding?");
            return Outcome::Completed;
        }

        if save_draft {
            let draft = self.compose.read(ComposeState::draft);
            if self.store_draft(&draft).await {
                self.signals.success("Draft saved and discarded.");
            } else {
                self.signals.error("Failed to save draft.");
            }
        } else {
            self.signals.info("Draft discarded.");
        }

        self.close_compose();
        Outcome::Completed
    }

    async fn fill(&self, to: &str, subject: &str, body: &str) -> FillOutcome {
        let outcome = typing::fill_draft(&self.compose, &self.config.pacing, to, subject, body).await;
        if outcome == FillOutcome::Cancelled {
            debug!("compose panel closed during fill");
        }
        outcome
    }

    async fn store_draft(&self, draft: &Draft) -> bool {
        match self.mail.save_draft(draft).await {
            Ok(receipt) => {
                info!(id = %receipt.id, "draft saved");
                true
            }
            Err(err) => {
                warn!(error = %err, "draft save failed");
                false
            }
        }
    }

    fn close_compose(&self) {
        self.compose.update(|state| {
            state.reset();
            state.close();
        });
    }

    // Bounds go through set_date_range so both copies stay in step.
    fn apply_filter_patch(&self, mut patch: FilterPatch) {
        self.mailbox.update(|state| {
            if patch.has_date_bounds() {
                let bounds = patch.take_date_bounds();
                state.set_date_range(bounds.from, bounds.to);
            }
            if !patch.is_empty() {
                state.merge_filter(patch);
            }
        });
    }
}
