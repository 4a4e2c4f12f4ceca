use clap::{ArgAction, Args, Parser, Subcommand};

use crate::state::View;

#[derive(Debug, Parser)]
#[command(
    name = "mailpilot",
    version,
    about = "Assistant-driven Gmail client for the terminal"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive session with the assistant
    Chat,
    /// Send one message to the assistant and run what it asks for
    Ask(AskArgs),
    /// Run a structured action given as JSON
    Exec(ExecArgs),
    /// List one page of a mailbox view
    List(ListArgs),
    /// Show the signed-in account
    Profile,
    /// Store an access token for this profile
    Token(TokenArgs),
}

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, num_args = 1.., help = "Message for the assistant")]
    pub message: Vec<String>,
}

impl AskArgs {
    pub fn text(&self) -> String {
        self.message.join(" ")
    }
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    #[arg(help = "Action JSON, e.g. '{\"type\":\"navigate\",\"view\":\"sent\"}'")]
    pub action: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, default_value_t = View::Inbox, help = "Mailbox view")]
    pub view: View,
    #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
    pub page: usize,
    #[arg(long, help = "Gmail search query")]
    pub q: Option<String>,
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(help = "OAuth access token with Gmail scopes")]
    pub access_token: String,
    #[arg(long, help = "Refresh token, revoked on logout")]
    pub refresh_token: Option<String>,
    #[arg(long, help = "Seconds until the access token expires")]
    pub expires_in: Option<u64>,
}
