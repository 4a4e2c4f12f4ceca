use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::api::SessionService;
use crate::error::{AppError, AppResult};

use super::credentials::CredentialStore;

const GOOGLE_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";

#[derive(Clone)]
pub struct GoogleSession {
    profile: String,
    store: Arc<dyn CredentialStore>,
    http: Client,
    revoke_url: String,
}

impl GoogleSession {
    pub fn new(profile: impl Into<String>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_revoke_url(profile, store, GOOGLE_REVOKE_ENDPOINT)
    }

    pub fn with_revoke_url(
        profile: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        revoke_url: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            store,
            http: Client::new(),
            revoke_url: revoke_url.into(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    async fn revoke(&self, token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(&self.revoke_url)
            .form(&HashMap::from([("token", token.to_string())]))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(AppError::Auth(format!(
            "revoke endpoint returned {}",
            response.status()
        )))
    }
}

#[async_trait]
impl SessionService for GoogleSession {
    // Local credentials are dropped even when the revoke fails.
    async fn terminate_session(&self) -> AppResult<()> {
        let revoked = match self.store.load(&self.profile)? {
            Some(token) => self.revoke(token.revocable()).await,
            None => Ok(()),
        };

        let had_credentials = self.store.forget(&self.profile)?;

        match &revoked {
            Ok(()) => info!(profile = %self.profile, had_credentials, "session terminated"),
            Err(err) => warn!(profile = %self.profile, error = %err, "local credentials removed but revoke failed"),
        }
        revoked
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::TokenSet;

    #[derive(Default)]
    struct MemoryStore {
        token: Mutex<Option<TokenSet>>,
    }

    impl CredentialStore for MemoryStore {
        fn load(&self, _profile: &str) -> AppResult<Option<TokenSet>> {
            Ok(self.token.lock().expect("lock").clone())
        }

        fn store(&self, _profile: &str, token: &TokenSet) -> AppResult<()> {
            *self.token.lock().expect("lock") = Some(token.clone());
            Ok(())
        }

        fn forget(&self, _profile: &str) -> AppResult<bool> {
            Ok(self.token.lock().expect("lock").take().is_some())
        }
    }

    fn store_with_token() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::default());
        store
            .store(
                "default",
                &TokenSet {
                    access_token: "access".to_string(),
                    refresh_token: Some("refresh".to_string()),
                    expires_at_unix: None,
                    email: None,
                },
            )
            .expect("save");
        store
    }

    #[tokio::test]
    async fn revokes_refresh_token_and_clears_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/revoke"))
            .and(body_string_contains("token=refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_with_token();
        let session = GoogleSession::with_revoke_url(
            "default",
            store.clone(),
            format!("{}/revoke", server.uri()),
        );

        session.terminate_session().await.expect("terminate");
        assert!(store.load("default").expect("load").is_none());
    }

    #[tokio::test]
    async fn clears_store_even_when_revoke_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/revoke"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let store = store_with_token();
        let session = GoogleSession::with_revoke_url(
            "default",
            store.clone(),
            format!("{}/revoke", server.uri()),
        );

        let err = session.terminate_session().await.expect_err("revoke fails");
        assert!(matches!(err, AppError::Auth(_)));
        assert!(store.load("default").expect("load").is_none());
    }
}
