use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let engine = ctx.engine()?;
    let profile = engine.load_profile().await?;

    let text = format!("{}: {}", ctx.profile, profile.email_address);
    ctx.output.emit(&text, &profile)
}
