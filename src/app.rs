use crate::cli::{Cli, Command};
use crate::commands;
use crate::context::AppContext;
use crate::error::AppResult;

pub async fn run(cli: Cli) -> AppResult<()> {
    let Cli {
        profile,
        json,
        verbose,
        command,
    } = cli;

    let ctx = AppContext::bootstrap(profile, json, verbose)?;

    match command {
        Command::Chat => commands::chat::run(&ctx).await,
        Command::Ask(args) => commands::ask::run(&ctx, args).await,
        Command::Exec(args) => commands::exec::run(&ctx, args).await,
        Command::List(args) => commands::list::run(&ctx, args).await,
        Command::Profile => commands::profile::run(&ctx).await,
        Command::Token(args) => commands::token::run(&ctx, args),
    }
}
