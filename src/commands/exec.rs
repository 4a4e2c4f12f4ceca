use serde_json::Value;

use crate::cli::ExecArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

use super::events::{self, Transcript};

pub async fn run(ctx: &AppContext, args: ExecArgs) -> AppResult<()> {
    let action = parse_action(&args.action)?;

    let engine = ctx.engine()?;
    super::prime(&engine).await;

    let mut transcript = Transcript::start(&engine);
    let outcome = engine.dispatch(action).await;
    transcript.flush(&engine, &ctx.output)?;
    events::print_outcome(&ctx.output, outcome)
}

pub fn parse_action(raw: &str) -> AppResult<Value> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|err| AppError::InvalidInput(format!("action is not valid JSON: {err}")))?;

    if !value.is_object() {
        return Err(AppError::InvalidInput(
            "action must be a JSON object with a `type` field".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_objects_only() {
        assert!(parse_action(r#" {"type":"send"} "#).is_ok());
        assert!(parse_action("[1,2]").is_err());
        assert!(parse_action("{type: send}").is_err());
    }
}
