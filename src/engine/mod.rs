pub mod action;
pub mod chat;
pub mod handlers;
pub mod listing;
pub mod reply;
pub mod search;
pub mod signals;
pub mod typing;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::models::Role;
use crate::api::{AssistantService, MailService, SessionService};
use crate::config::PacingSettings;
use crate::state::{
    ComposeState, ComposeStore, ConversationState, ConversationStore, MailboxState, MailboxStore,
    Store,
};

pub use action::{Action, ActionError, NavTarget};
pub use signals::{HighlightTarget, NoticeLevel, ViewEvent, ViewSignals};
pub use typing::FillOutcome;

const DEFAULT_PAGE_SIZE: u32 = 50;
const DEFAULT_SEARCH_MAX_RESULTS: u32 = 5;
const DEFAULT_MAX_CHAIN_DEPTH: usize = 4;
const FLASH: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    pub to_char: Duration,
    pub subject_char: Duration,
    pub body_char: Duration,
    pub compose_settle: Duration,
    pub reply_settle: Duration,
    pub highlight_lead: Duration,
    pub highlight_duration: Duration,
    pub open_email: Duration,
    pub navigate: Duration,
    pub chain: Duration,
    pub logout: Duration,
    pub assistant_settle: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        PacingSettings::default().to_pacing()
    }
}

impl Pacing {
    pub fn instant() -> Self {
        Self {
            to_char: Duration::ZERO,
            subject_char: Duration::ZERO,
            body_char: Duration::ZERO,
            compose_settle: Duration::ZERO,
            reply_settle: Duration::ZERO,
            highlight_lead: Duration::ZERO,
            highlight_duration: Duration::ZERO,
            open_email: Duration::ZERO,
            navigate: Duration::ZERO,
            chain: Duration::ZERO,
            logout: Duration::ZERO,
            assistant_settle: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub pacing: Pacing,
    pub page_size: u32,
    pub search_max_results: u32,
    pub max_chain_depth: usize,
    pub user_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pacing: Pacing::default(),
            page_size: DEFAULT_PAGE_SIZE,
            search_max_results: DEFAULT_SEARCH_MAX_RESULTS,
            max_chain_depth: DEFAULT_MAX_CHAIN_DEPTH,
            user_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Aborted,
    /// Undecodable input; nothing changed.
    Dropped,
}

type OutcomeFuture<'a> = Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;

#[derive(Clone)]
pub struct Engine {
    mailbox: MailboxStore,
    compose: ComposeStore,
    conversation: ConversationStore,
    mail: Arc<dyn MailService>,
    assistant: Arc<dyn AssistantService>,
    session: Arc<dyn SessionService>,
    signals: ViewSignals,
    config: Arc<EngineConfig>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        mail: Arc<dyn MailService>,
        assistant: Arc<dyn AssistantService>,
        session: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            mailbox: Store::new(MailboxState::new()),
            compose: Store::new(ComposeState::new()),
            conversation: Store::new(ConversationState::new()),
            mail,
            assistant,
            session,
            signals: ViewSignals::new(),
            config: Arc::new(config),
        }
    }

    pub fn mailbox(&self) -> &MailboxStore {
        &self.mailbox
    }

    pub fn compose(&self) -> &ComposeStore {
        &self.compose
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    pub fn signals(&self) -> &ViewSignals {
        &self.signals
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn execute(&self, action: Action) -> Outcome {
        self.execute_at(action, 0).await
    }

    pub async fn dispatch(&self, value: Value) -> Outcome {
        match Action::from_value(value) {
            Ok(action) => self.execute(action).await,
            Err(err) => {
                warn!(error = %err, "dropping action");
                Outcome::Dropped
            }
        }
    }

    fn execute_at(&self, action: Action, depth: usize) -> OutcomeFuture<'_> {
        Box::pin(async move {
            if depth > self.config.max_chain_depth {
                warn!(
                    kind = action.kind(),
                    depth,
                    cap = self.config.max_chain_depth,
                    "chained action refused"
                );
                self.say(format!(
                    "I stopped before running another \"{}\" step because too many actions were chained together.",
                    action.kind()
                ));
                return Outcome::Aborted;
            }

            debug!(kind = action.kind(), depth, "executing action");
            self.signals.highlight(HighlightTarget::AssistantIcon, FLASH);

            match action {
                Action::Compose { to, subject, body } => self.compose_new(&to, &subject, &body).await,
                Action::Reply { email_id, body } => self.reply(&email_id, &body).await,
                Action::Navigate { view } => self.navigate(view).await,
                Action::Search { query, filters } => self.search(query, filters),
                Action::GmailSearch { query } => self.gmail_search(&query, depth).await,
                Action::Filter { filters } => self.filter(filters),
                Action::ClearFilters {} => self.clear_filters(),
                Action::OpenEmail { email_id } => self.open_email(&email_id).await,
                Action::Send {} => self.send().await,
                Action::SaveDraft {} => self.save_draft().await,
                Action::Summarize { .. } => {
                    self.signals.info("Email summary generated");
                    Outcome::Completed
                }
                Action::Logout {} => self.logout().await,
                Action::DiscardCompose {
                    needs_confirmation,
                    save_draft,
                } => self.discard_compose(needs_confirmation, save_draft).await,
            }
        })
    }

    fn say(&self, content: impl Into<String>) {
        self.conversation
            .update(|state| state.append(Role::Assistant, content));
    }
}

// For literal patterns only.
fn pattern(source: &'static str) -> Regex {
    match Regex::new(source) {
        Ok(regex) => regex,
        Err(err) => panic!("invalid built-in pattern `{source}`: {err}"),
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
