use std::sync::Arc;
use std::time::SystemTime;

use crate::api::{AssistantClient, GmailClient};
use crate::auth::{CredentialFile, CredentialStore, GoogleSession};
use crate::config::{self, AppPaths, Settings};
use crate::engine::Engine;
use crate::error::AppResult;
use crate::output::Output;

pub struct AppContext {
    pub profile: String,
    pub verbose: u8,
    pub paths: AppPaths,
    pub settings: Settings,
    pub credentials: Arc<CredentialFile>,
    pub output: Output,
}

impl AppContext {
    pub fn bootstrap(profile: String, json: bool, verbose: u8) -> AppResult<Self> {
        let profile = config::resolve_profile(&profile);
        let paths = AppPaths::discover()?;
        let settings = config::load_settings(&paths, &profile)?;
        let credentials = Arc::new(CredentialFile::new(paths.clone()));
        let output = Output::new(json);

        Ok(Self {
            profile,
            verbose,
            paths,
            settings,
            credentials,
            output,
        })
    }

    pub fn access_token(&self) -> AppResult<String> {
        self.credentials.access_token(&self.profile, SystemTime::now())
    }

    pub fn engine(&self) -> AppResult<Engine> {
        let access_token = self.access_token()?;
        let config = self.settings.engine_config()?;
        let session = GoogleSession::new(self.profile.clone(), self.credentials.clone());

        Ok(Engine::new(
            config,
            Arc::new(GmailClient::new(access_token)),
            Arc::new(AssistantClient::new(self.settings.assistant_url())),
            Arc::new(session),
        ))
    }
}
