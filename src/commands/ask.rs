use crate::cli::AskArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

use super::events::{self, Transcript};

pub async fn run(ctx: &AppContext, args: AskArgs) -> AppResult<()> {
    let text = args.text();
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput("message must not be empty".to_string()));
    }

    let engine = ctx.engine()?;
    super::prime(&engine).await;

    let mut transcript = Transcript::start(&engine);
    let outcome = engine.ask(&text).await;
    transcript.flush(&engine, &ctx.output)?;

    match outcome {
        Some(outcome) => events::print_outcome(&ctx.output, outcome),
        None => Ok(()),
    }
}
