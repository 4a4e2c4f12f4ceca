use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::api::models::ListRequest;
use crate::context::AppContext;
use crate::engine::Engine;
use crate::error::AppResult;

use super::events::{self, Transcript};
use super::exec::parse_action;

const HELP: &str = "commands: /do <json>  /next  /prev  /refresh  /open <id>  /trash <id>  /quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Ask(&'a str),
    Do(&'a str),
    Next,
    Prev,
    Refresh,
    Open(&'a str),
    Trash(&'a str),
    Help,
    Quit,
    Empty,
}

/// Splits a REPL line into a slash command or free text for the assistant.
pub fn parse_line(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Ask(line);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(name, rest)| (name, rest.trim()))
        .unwrap_or((command, ""));

    match (name, rest) {
        ("do", json) if !json.is_empty() => ChatInput::Do(json),
        ("next", _) => ChatInput::Next,
        ("prev", _) => ChatInput::Prev,
        ("refresh", _) => ChatInput::Refresh,
        ("open", id) if !id.is_empty() => ChatInput::Open(id),
        ("trash", id) if !id.is_empty() => ChatInput::Trash(id),
        ("quit" | "exit" | "q", _) => ChatInput::Quit,
        _ => ChatInput::Help,
    }
}

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let engine = ctx.engine()?;
    super::prime(&engine).await;

    let mut transcript = Transcript::start(&engine);
    if let Some(greeting) = engine.conversation().read(|state| state.messages().first().cloned()) {
        events::print_message(&ctx.output, &greeting)?;
    }
    print_listing_summary(ctx, &engine)?;

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = parse_line(&line);
        let before = listing_key(&engine);

        match input {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Help => {
                ctx.output.emit(HELP, &HELP)?;
                continue;
            }
            ChatInput::Ask(text) => {
                if engine.ask(text).await.is_none() {
                    ctx.output.emit("(still working on the last message)", &())?;
                }
            }
            ChatInput::Do(raw) => match parse_action(raw) {
                Ok(action) => {
                    let outcome = engine.dispatch(action).await;
                    events::print_outcome(&ctx.output, outcome)?;
                }
                Err(err) => ctx.output.emit(&format!("error: {err}"), &err.to_string())?,
            },
            ChatInput::Next => {
                if !engine.next_page().await {
                    ctx.output.emit("no next page", &())?;
                }
            }
            ChatInput::Prev => {
                if !engine.prev_page().await {
                    ctx.output.emit("already on the first page", &())?;
                }
            }
            ChatInput::Refresh => {
                engine.refresh().await;
            }
            ChatInput::Open(id) => open(ctx, &engine, id).await?,
            ChatInput::Trash(id) => {
                engine.trash(id).await;
            }
        }

        // An action that changed the query without loading anything itself
        // (navigate, filter) needs a fresh page; a mailbox search already
        // installed its results.
        let after = listing_key(&engine);
        let requery = matches!(input, ChatInput::Ask(_) | ChatInput::Do(_))
            && after.0 != before.0
            && after.1 == before.1;
        if requery {
            debug!("mailbox query changed, reloading");
            engine.refresh().await;
        }

        transcript.flush(&engine, &ctx.output)?;
        if requery || matches!(input, ChatInput::Next | ChatInput::Prev | ChatInput::Refresh) {
            print_listing_summary(ctx, &engine)?;
        }
    }

    Ok(())
}

async fn open(ctx: &AppContext, engine: &Engine, id: &str) -> AppResult<()> {
    if !engine.open_message(id) {
        return ctx.output.emit(&format!("{id} is not in the current list"), &());
    }

    let Some(message) = engine.mailbox().read(|state| state.selected().cloned()) else {
        return Ok(());
    };
    let Some(thread) = engine.load_thread(&message.thread_id).await else {
        return Ok(());
    };

    if ctx.output.mode() == crate::output::OutputMode::Json {
        return ctx.output.emit("", &thread);
    }
    for entry in &thread {
        println!("from: {}", entry.from);
        println!("subject: {}", entry.subject);
        println!("date: {}", entry.date);
        println!();
        println!("{}", entry.body_text.as_deref().unwrap_or(&entry.snippet));
        println!();
    }
    Ok(())
}

fn listing_key(engine: &Engine) -> (ListRequest, Vec<String>) {
    engine.mailbox().read(|state| {
        (
            state.list_request(0),
            state.messages().iter().map(|m| m.id.clone()).collect(),
        )
    })
}

fn print_listing_summary(ctx: &AppContext, engine: &Engine) -> AppResult<()> {
    let (view, page, count, unread) = engine.mailbox().read(|state| {
        (
            state.view(),
            state.current_page() + 1,
            state.messages().len(),
            state.messages().iter().filter(|m| !m.is_read).count(),
        )
    });
    ctx.output.emit(
        &format!("{view}: page {page}, {count} messages ({unread} unread)"),
        &serde_json::json!({"view": view, "page": page, "count": count, "unread": unread}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_commands() {
        assert_eq!(parse_line("/next"), ChatInput::Next);
        assert_eq!(parse_line("  /open  m-1 "), ChatInput::Open("m-1"));
        assert_eq!(parse_line(r#"/do {"type":"send"}"#), ChatInput::Do(r#"{"type":"send"}"#));
        assert_eq!(parse_line("/quit"), ChatInput::Quit);
    }

    #[test]
    fn incomplete_commands_show_help() {
        assert_eq!(parse_line("/open"), ChatInput::Help);
        assert_eq!(parse_line("/do"), ChatInput::Help);
        assert_eq!(parse_line("/bogus"), ChatInput::Help);
    }

    #[test]
    fn plain_text_goes_to_the_assistant() {
        assert_eq!(parse_line("find mail from jane"), ChatInput::Ask("find mail from jane"));
        assert_eq!(parse_line("   "), ChatInput::Empty);
    }
}
