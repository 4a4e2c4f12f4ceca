use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{AppError, AppResult};

use super::models::{AssistantContext, AssistantReply, ChatTurn};
use super::service::AssistantService;

const ASSISTANT_PATH: &str = "api/assistant";

/// HTTP client for the assistant backend.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AssistantRequest<'a> {
    message: &'a str,
    history: &'a [ChatTurn],
    context: &'a AssistantContext,
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn endpoint_url(&self) -> AppResult<Url> {
        let base = format!("{}/", self.base_url.trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(ASSISTANT_PATH)?)
    }
}

#[async_trait]
impl AssistantService for AssistantClient {
    async fn respond(
        &self,
        message: &str,
        history: &[ChatTurn],
        context: &AssistantContext,
    ) -> AppResult<AssistantReply> {
        let url = self.endpoint_url()?;
        debug!(%url, history = history.len(), view = %context.current_view, "asking assistant");

        let response = self
            .http
            .post(url)
            .json(&AssistantRequest {
                message,
                history,
                context,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            return Err(AppError::Assistant(if body.is_empty() {
                format!("assistant request failed ({status})")
            } else {
                format!("assistant request failed ({status}): {body}")
            }));
        }

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_respects_base_path() {
        let client = AssistantClient::new("http://localhost:8000/");
        assert_eq!(
            client.endpoint_url().expect("url").as_str(),
            "http://localhost:8000/api/assistant"
        );

        let nested = AssistantClient::new("https://example.com/mail");
        assert_eq!(
            nested.endpoint_url().expect("url").as_str(),
            "https://example.com/mail/api/assistant"
        );
    }

    #[test]
    fn request_body_uses_wire_names() {
        let history = vec![ChatTurn {
            role: crate::api::models::Role::User,
            content: "hi".to_string(),
        }];
        let context = AssistantContext {
            current_view: "inbox".to_string(),
            ..AssistantContext::default()
        };
        let body = serde_json::to_value(AssistantRequest {
            message: "find mail",
            history: &history,
            context: &context,
        })
        .expect("serialize");

        assert_eq!(body["message"], "find mail");
        assert_eq!(body["history"][0]["role"], "user");
        assert_eq!(body["context"]["currentView"], "inbox");
        assert!(body["context"]["currentEmail"].is_null());
    }
}
