pub mod compose;
pub mod conversation;
pub mod mailbox;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use compose::{ComposeField, ComposePhase, ComposeState, PanelHandle, ReplyContext};
pub use conversation::{ChatMessage, ConversationState, MessageId};
pub use mailbox::{DateRange, FetchTicket, Filter, FilterPatch, MailboxState, View};

pub type MailboxStore = Store<MailboxState>;
pub type ComposeStore = Store<ComposeState>;
pub type ConversationStore = Store<ConversationState>;

#[derive(Debug, Default)]
pub struct Store<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

// Closures passed to `read`/`update` run under the lock and must not await.
impl<T> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Store<T> {
    pub fn snapshot(&self) -> T {
        self.read(T::clone)
    }
}
