use serde::Serialize;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::warn;

use crate::api::models::Role;
use crate::engine::{Engine, HighlightTarget, Outcome, ViewEvent};
use crate::error::AppResult;
use crate::output::{Output, OutputMode};
use crate::state::{ChatMessage, MessageId};

pub struct Transcript {
    events: Receiver<ViewEvent>,
    since: Option<MessageId>,
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
    outcome: &'a str,
}

impl Transcript {
    pub fn start(engine: &Engine) -> Self {
        Self {
            events: engine.signals().subscribe(),
            since: engine.conversation().read(|state| state.last().map(|m| m.id)),
        }
    }

    /// Prints pending view events, then conversation messages appended since
    /// the last flush.
    pub fn flush(&mut self, engine: &Engine, output: &Output) -> AppResult<()> {
        loop {
            match self.events.try_recv() {
                Ok(event) => print_event(output, &event)?,
                Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "view events dropped"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let fresh: Vec<ChatMessage> = engine.conversation().read(|state| match self.since {
            Some(id) => state.since(id).to_vec(),
            None => state.messages().to_vec(),
        });
        for message in &fresh {
            print_message(output, message)?;
        }
        if let Some(last) = fresh.last() {
            self.since = Some(last.id);
        }
        Ok(())
    }
}

pub fn print_outcome(output: &Output, outcome: Outcome) -> AppResult<()> {
    let label = match outcome {
        Outcome::Completed => "completed",
        Outcome::Aborted => "aborted",
        Outcome::Dropped => "dropped",
    };
    match output.mode() {
        OutputMode::Json => output.emit(label, &OutcomeRecord { outcome: label }),
        OutputMode::Text if outcome == Outcome::Dropped => {
            output.emit("(not a recognised action; nothing done)", &())
        }
        OutputMode::Text => Ok(()),
    }
}

pub fn print_message(output: &Output, message: &ChatMessage) -> AppResult<()> {
    let speaker = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    output.emit(&format!("{speaker}: {}", message.content), message)
}

fn print_event(output: &Output, event: &ViewEvent) -> AppResult<()> {
    let text = match event {
        ViewEvent::Notice { level, text } => {
            format!("[{}] {text}", level.as_str())
        }
        ViewEvent::Navigate { route } => format!("-> {route}"),
        ViewEvent::SignedOut { .. } => "signed out".to_string(),
        ViewEvent::Highlight {
            target: HighlightTarget::MessageRow { id },
            ..
        } => format!("* {id}"),
        ViewEvent::Highlight { .. } | ViewEvent::Reveal { .. } => {
            if output.mode() == OutputMode::Json {
                return output.emit("", event);
            }
            return Ok(());
        }
    };
    output.emit(&text, event)
}
