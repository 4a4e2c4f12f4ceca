use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::config::AppPaths;
use crate::error::{AppError, AppResult};

use super::TokenSet;

/// Where a profile's Gmail credentials live between runs.
pub trait CredentialStore: Send + Sync {
    fn load(&self, profile: &str) -> AppResult<Option<TokenSet>>;

    fn store(&self, profile: &str, token: &TokenSet) -> AppResult<()>;

    /// Returns whether anything was stored for the profile.
    fn forget(&self, profile: &str) -> AppResult<bool>;

    fn access_token(&self, profile: &str, now: SystemTime) -> AppResult<String> {
        let token = self.load(profile)?.ok_or_else(|| {
            AppError::Auth(format!(
                "no access token for profile `{profile}`. run `mailpilot token <ACCESS_TOKEN>`"
            ))
        })?;

        if token.is_expired(now) {
            return Err(AppError::Auth(format!(
                "access token for profile `{profile}` has expired. store a fresh one with `mailpilot token`"
            )));
        }

        Ok(token.access_token)
    }
}

#[derive(Debug, Clone)]
pub struct CredentialFile {
    paths: AppPaths,
}

impl CredentialFile {
    pub fn new(paths: AppPaths) -> Self {
        Self { paths }
    }
}

impl CredentialStore for CredentialFile {
    fn load(&self, profile: &str) -> AppResult<Option<TokenSet>> {
        let raw = match fs::read_to_string(self.paths.token_file(profile)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        serde_json::from_str(&raw).map(Some).map_err(|err| {
            AppError::Auth(format!(
                "stored credentials for profile `{profile}` are unreadable ({err}). run `mailpilot token` again"
            ))
        })
    }

    fn store(&self, profile: &str, token: &TokenSet) -> AppResult<()> {
        let path = self.paths.token_file(profile);
        let staging = path.with_extension("json.tmp");

        write_private(&staging, &serde_json::to_vec_pretty(token)?)?;
        fs::rename(&staging, &path)?;
        debug!(profile, path = %path.display(), "credentials stored");
        Ok(())
    }

    fn forget(&self, profile: &str) -> AppResult<bool> {
        match fs::remove_file(self.paths.token_file(profile)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn write_private(path: &Path, payload: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(payload)?;
    file.sync_all()
}
