use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::info;

use crate::auth::{CredentialStore, TokenSet};
use crate::cli::TokenArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct TokenSaved {
    profile: String,
    expires_at_unix: Option<u64>,
    has_refresh_token: bool,
}

pub fn run(ctx: &AppContext, args: TokenArgs) -> AppResult<()> {
    let access_token = args.access_token.trim();
    if access_token.is_empty() {
        return Err(AppError::InvalidInput("access token must not be empty".to_string()));
    }

    let token = TokenSet {
        access_token: access_token.to_string(),
        refresh_token: args
            .refresh_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()),
        expires_at_unix: args.expires_in.map(expires_at_unix),
        email: None,
    };
    ctx.credentials.store(&ctx.profile, &token)?;
    info!(profile = %ctx.profile, "access token stored");

    let saved = TokenSaved {
        profile: ctx.profile.clone(),
        expires_at_unix: token.expires_at_unix,
        has_refresh_token: token.refresh_token.is_some(),
    };
    ctx.output
        .emit(&format!("{}: access token stored", ctx.profile), &saved)
}

fn expires_at_unix(expires_in: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or_default();
    now.saturating_add(expires_in)
}
