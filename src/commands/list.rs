use serde::Serialize;

use crate::api::models::Message;
use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::engine::search::compact_preview;
use crate::error::{AppError, AppResult};
use crate::output::OutputMode;
use crate::state::{FilterPatch, View};

#[derive(Debug, Serialize)]
struct ListedPage<'a> {
    view: View,
    page: usize,
    has_next_page: bool,
    messages: &'a [Message],
}

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    if args.page == 0 {
        return Err(AppError::InvalidInput(
            "--page starts at 1".to_string(),
        ));
    }

    let engine = ctx.engine()?;
    engine.mailbox().update(|state| {
        state.set_view(args.view);
        if let Some(query) = args.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            state.merge_filter(FilterPatch {
                query: Some(query.to_string()),
                ..FilterPatch::default()
            });
        }
    });

    // Cursors are only learned by walking forward one page at a time.
    if !engine.refresh().await {
        return Err(AppError::Api("failed to load messages".to_string()));
    }
    for _ in 1..args.page {
        if !engine.next_page().await {
            return Err(AppError::NotFound(format!(
                "page {} is past the end of {}",
                args.page, args.view
            )));
        }
    }

    let (messages, page, has_next_page) = engine.mailbox().read(|state| {
        (
            state.messages().to_vec(),
            state.current_page() + 1,
            state.has_next_page(),
        )
    });

    if ctx.output.mode() == OutputMode::Json {
        return ctx.output.emit(
            "",
            &ListedPage {
                view: args.view,
                page,
                has_next_page,
                messages: &messages,
            },
        );
    }

    if messages.is_empty() {
        println!("0 messages");
        return Ok(());
    }

    for (index, message) in messages.iter().enumerate() {
        let marker = if message.is_read { ' ' } else { '*' };
        println!("{marker}{}. {}", index + 1, message.id);
        println!("   from: {}", message.from);
        println!("   subject: {}", message.subject);
        println!("   date: {}", message.date);
        println!();
        println!("   {}", format_preview(&message.snippet));

        if index + 1 < messages.len() {
            println!();
        }
    }

    if has_next_page {
        println!();
        println!("more: --page {}", page + 1);
    }
    Ok(())
}

fn format_preview(snippet: &str) -> String {
    if snippet.trim().is_empty() {
        return "(no preview)".to_string();
    }
    compact_preview(snippet)
}
