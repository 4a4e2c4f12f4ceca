use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::error::{AppError, AppResult};

use super::messages;
use super::mime::{self, OutgoingMessage};
use super::models::{Draft, ListRequest, Message, MessagePage, Profile, SendReceipt};
use super::service::MailService;

const GMAIL_API_BASE_URL: &str = "https://gmail.googleapis.com";
const UNREAD_LABEL: &str = "UNREAD";

#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(GMAIL_API_BASE_URL, access_token)
    }

    pub fn with_base_url(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    async fn get_message(&self, id: &str) -> AppResult<Message> {
        let endpoint = messages::message_endpoint(id);
        let resource: GmailMessageResource = self
            .get_json(&endpoint, Some(&messages::full_query()))
            .await?;
        Ok(resource.into_message())
    }

    async fn get_messages(&self, entries: Vec<GmailMessageListEntry>) -> AppResult<Vec<Message>> {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(self.get_message(&entry.id).await?);
        }
        Ok(results)
    }

    async fn send_raw(&self, raw: String, thread_id: Option<String>) -> AppResult<SendReceipt> {
        let request = GmailSendRequest { raw, thread_id };
        let response: GmailSendResponse = self
            .post_json(&messages::send_endpoint(), &request)
            .await?;

        Ok(SendReceipt {
            id: response.id,
            thread_id: response.thread_id,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let mut request = self.http.get(url).bearer_auth(&self.access_token);
        if let Some(query) = query {
            request = request.query(query);
        }

        let response = request.send().await?;
        self.parse_json_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        let url = self.endpoint_url(endpoint)?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        self.parse_json_response(response).await
    }

    fn endpoint_url(&self, endpoint: &str) -> AppResult<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.set_path(endpoint.trim_start_matches('/'));
        Ok(url)
    }

    async fn parse_json_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_api_error(status, &body))
    }
}

#[async_trait]
impl MailService for GmailClient {
    async fn list_messages(&self, request: &ListRequest) -> AppResult<MessagePage> {
        let query = messages::list_query(request);
        let listing: GmailMessageListResource = self
            .get_json(&messages::list_endpoint(), Some(&query))
            .await?;

        let messages = self
            .get_messages(listing.messages.unwrap_or_default())
            .await?;
        debug!(count = messages.len(), "listed messages");

        Ok(MessagePage {
            messages,
            next_cursor: listing.next_page_token,
        })
    }

    async fn send_message(&self, draft: &Draft) -> AppResult<SendReceipt> {
        let raw = mime::build_raw_message(&OutgoingMessage {
            to: draft.to.clone(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
            ..OutgoingMessage::default()
        });
        let receipt = self.send_raw(raw, None).await?;
        info!(id = %receipt.id, "message sent");
        Ok(receipt)
    }

    async fn reply_to_message(
        &self,
        draft: &Draft,
        source_message_id: &str,
        thread_id: &str,
    ) -> AppResult<SendReceipt> {
        let parent: GmailMessageResource = self
            .get_json(
                &messages::message_endpoint(source_message_id),
                Some(&messages::threading_query()),
            )
            .await?;
        let headers = parent.headers();
        let in_reply_to = header_value(headers, "Message-ID");
        let references = mime::merge_references(
            header_value(headers, "References").as_deref(),
            in_reply_to.as_deref(),
        );

        let raw = mime::build_raw_message(&OutgoingMessage {
            to: draft.to.clone(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
            in_reply_to,
            references,
        });
        let receipt = self.send_raw(raw, Some(thread_id.to_string())).await?;
        info!(id = %receipt.id, thread_id, "reply sent");
        Ok(receipt)
    }

    async fn save_draft(&self, draft: &Draft) -> AppResult<SendReceipt> {
        let raw = mime::build_raw_message(&OutgoingMessage {
            to: draft.to.clone(),
            subject: draft.subject.clone(),
            body: draft.body.clone(),
            ..OutgoingMessage::default()
        });
        let request = GmailDraftRequest {
            message: GmailSendRequest {
                raw,
                thread_id: draft.thread_id.clone(),
            },
        };
        let response: GmailDraftResponse = self
            .post_json(&messages::drafts_endpoint(), &request)
            .await?;
        info!(id = %response.id, "draft saved");

        Ok(SendReceipt {
            id: response.id,
            thread_id: response.message.and_then(|message| message.thread_id),
        })
    }

    async fn fetch_thread(&self, thread_id: &str) -> AppResult<Vec<Message>> {
        let thread: GmailThreadResource = self
            .get_json(
                &messages::thread_endpoint(thread_id),
                Some(&messages::full_query()),
            )
            .await?;

        let mut messages = thread
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(GmailMessageResource::into_message)
            .collect::<Vec<_>>();
        messages.sort_by_key(|message| message.internal_date);
        Ok(messages)
    }

    async fn trash_message(&self, id: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .post_json(&messages::trash_endpoint(id), &serde_json::json!({}))
            .await?;
        info!(id, "message trashed");
        Ok(())
    }

    async fn search_mailbox(&self, query: &str, max_results: u32) -> AppResult<Vec<Message>> {
        let params = messages::search_query(query, max_results);
        let listing: GmailMessageListResource = self
            .get_json(&messages::list_endpoint(), Some(&params))
            .await?;
        self.get_messages(listing.messages.unwrap_or_default())
            .await
    }

    async fn get_profile(&self) -> AppResult<Profile> {
        let profile: GmailProfileResource = self
            .get_json(&messages::profile_endpoint(), None)
            .await?;
        Ok(Profile {
            email_address: profile.email_address,
        })
    }

    async fn mark_read(&self, ids: &[String]) -> AppResult<()> {
        let body = GmailModifyLabelsRequest {
            add_label_ids: Vec::new(),
            remove_label_ids: vec![UNREAD_LABEL.to_string()],
        };
        for id in ids {
            let _: serde_json::Value = self
                .post_json(&messages::modify_endpoint(id), &body)
                .await?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageResource {
    id: String,
    thread_id: Option<String>,
    label_ids: Option<Vec<String>>,
    snippet: Option<String>,
    internal_date: Option<String>,
    payload: Option<GmailMessagePayload>,
}

impl GmailMessageResource {
    fn headers(&self) -> &[GmailMessageHeader] {
        self.payload
            .as_ref()
            .and_then(|payload| payload.headers.as_deref())
            .unwrap_or_default()
    }

    fn into_message(self) -> Message {
        let headers = self.headers();
        let subject = header_value(headers, "Subject").unwrap_or_else(|| "(no subject)".to_string());
        let from = header_value(headers, "From").unwrap_or_else(|| "(unknown)".to_string());
        let to = header_value(headers, "To").unwrap_or_default();
        let date = header_value(headers, "Date").unwrap_or_default();

        let (body_text, body_html, has_attachments) = match &self.payload {
            Some(payload) => {
                let mut bodies = Bodies::default();
                collect_bodies(payload, &mut bodies);
                (bodies.text, bodies.html, payload_has_attachments(payload))
            }
            None => (None, None, false),
        };

        let label_ids = self.label_ids.unwrap_or_default();
        let is_read = !label_ids.iter().any(|label| label == UNREAD_LABEL);

        Message {
            thread_id: self.thread_id.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            label_ids,
            from,
            to,
            subject,
            date,
            internal_date: self.internal_date.as_deref().and_then(parse_internal_date),
            snippet: self.snippet.unwrap_or_default(),
            body_text,
            body_html,
            is_read,
            has_attachments,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessagePayload {
    mime_type: Option<String>,
    filename: Option<String>,
    headers: Option<Vec<GmailMessageHeader>>,
    body: Option<GmailMessageBody>,
    parts: Option<Vec<GmailMessagePayload>>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageBody {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageHeader {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailMessageListResource {
    messages: Option<Vec<GmailMessageListEntry>>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailMessageListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailThreadResource {
    messages: Option<Vec<GmailMessageResource>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GmailProfileResource {
    email_address: String,
}

#[derive(Debug, Serialize)]
struct GmailSendRequest {
    raw: String,
    #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
    thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GmailSendResponse {
    id: String,
    #[serde(rename = "threadId")]
    thread_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct GmailDraftRequest {
    message: GmailSendRequest,
}

#[derive(Debug, Deserialize)]
struct GmailDraftResponse {
    id: String,
    message: Option<GmailSendResponse>,
}

#[derive(Debug, Serialize)]
struct GmailModifyLabelsRequest {
    #[serde(rename = "addLabelIds")]
    add_label_ids: Vec<String>,
    #[serde(rename = "removeLabelIds")]
    remove_label_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorEnvelope {
    error: GmailApiError,
}

#[derive(Debug, Deserialize)]
struct GmailApiError {
    code: Option<u16>,
    status: Option<String>,
    message: Option<String>,
    errors: Option<Vec<GmailApiErrorDetail>>,
}

#[derive(Debug, Deserialize)]
struct GmailApiErrorDetail {
    reason: Option<String>,
}

#[derive(Debug, Default)]
struct Bodies {
    text: Option<String>,
    html: Option<String>,
}

// First text/plain and first text/html leaf win, depth-first.
fn collect_bodies(payload: &GmailMessagePayload, bodies: &mut Bodies) {
    let mime_type = payload
        .mime_type
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let data = payload
        .body
        .as_ref()
        .and_then(|body| body.data.as_deref())
        .filter(|data| !data.is_empty());

    let inline = payload.filename.as_deref().is_none_or(str::is_empty);
    if let Some(data) = data.filter(|_| inline) {
        if let Ok(decoded) = mime::decode_body_data(data) {
            match mime_type.as_str() {
                "text/html" => {
                    bodies.html.get_or_insert(decoded);
                }
                "text/plain" => {
                    bodies.text.get_or_insert(decoded);
                }
                _ => {}
            }
        }
    }

    for part in payload.parts.iter().flatten() {
        collect_bodies(part, bodies);
    }
}

fn payload_has_attachments(payload: &GmailMessagePayload) -> bool {
    if payload.filename.as_deref().is_some_and(|name| !name.is_empty()) {
        return true;
    }
    payload.parts.iter().flatten().any(payload_has_attachments)
}

fn parse_internal_date(raw: &str) -> Option<DateTime<Utc>> {
    let millis = raw.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp_millis(millis)
}

fn header_value(headers: &[GmailMessageHeader], target: &str) -> Option<String> {
    headers
        .iter()
        .find(|header| header.name.eq_ignore_ascii_case(target))
        .map(|header| header.value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn map_api_error(status: StatusCode, body: &str) -> AppError {
    let message = parse_api_error_message(body).unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            "no error details in response body".to_string()
        } else {
            body.to_string()
        }
    });

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Auth(format!(
            "gmail api authorization failed ({status}): {message}. sign in again"
        ));
    }

    if status == StatusCode::NOT_FOUND {
        return AppError::NotFound(format!("gmail api ({status}): {message}"));
    }

    AppError::Api(format!("gmail api request failed ({status}): {message}"))
}

fn parse_api_error_message(body: &str) -> Option<String> {
    let envelope = serde_json::from_str::<GmailApiErrorEnvelope>(body).ok()?;
    let mut parts = Vec::new();

    if let Some(message) = envelope.error.message {
        parts.push(message);
    }

    if let Some(status) = envelope.error.status {
        parts.push(format!("status={status}"));
    }

    if let Some(code) = envelope.error.code {
        parts.push(format!("code={code}"));
    }

    if let Some(reason) = envelope
        .error
        .errors
        .and_then(|errors| errors.into_iter().find_map(|detail| detail.reason))
    {
        parts.push(format!("reason={reason}"));
    }

    if parts.is_empty() {
        return None;
    }

    Some(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    fn encoded(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text)
    }

    fn resource(json: serde_json::Value) -> GmailMessageResource {
        serde_json::from_value(json).expect("resource parse")
    }

    #[test]
    fn maps_full_message_resource() {
        let message = resource(serde_json::json!({
            "id": "msg-123",
            "threadId": "thread-456",
            "labelIds": ["INBOX", "UNREAD"],
            "snippet": "hello world",
            "internalDate": "1771236000000",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [
                    {"name": "Subject", "value": "hello"},
                    {"name": "From", "value": "Dev <dev@example.com>"},
                    {"name": "to", "value": "me@example.com"}
                ],
                "parts": [
                    {
                        "mimeType": "multipart/alternative",
                        "parts": [
                            {"mimeType": "text/plain", "body": {"data": encoded("plain body")}},
                            {"mimeType": "text/html", "body": {"data": encoded("<p>html body</p>")}}
                        ]
                    },
                    {"mimeType": "application/pdf", "filename": "a.pdf", "body": {"attachmentId": "x"}}
                ]
            }
        }))
        .into_message();

        assert_eq!(message.id, "msg-123");
        assert_eq!(message.thread_id, "thread-456");
        assert_eq!(message.subject, "hello");
        assert_eq!(message.from, "Dev <dev@example.com>");
        assert_eq!(message.to, "me@example.com");
        assert!(!message.is_read);
        assert!(message.has_attachments);
        assert_eq!(message.body_text.as_deref(), Some("plain body"));
        assert_eq!(message.body_html.as_deref(), Some("<p>html body</p>"));
        assert_eq!(
            message.internal_date.map(|date| date.timestamp_millis()),
            Some(1_771_236_000_000)
        );
    }

    #[test]
    fn missing_headers_fall_back_to_placeholders() {
        let message = resource(serde_json::json!({"id": "m1"})).into_message();
        assert_eq!(message.subject, "(no subject)");
        assert_eq!(message.from, "(unknown)");
        assert_eq!(message.thread_id, "m1");
        assert!(message.is_read);
        assert!(!message.has_attachments);
    }

    #[test]
    fn single_part_html_message_has_no_text_body() {
        let message = resource(serde_json::json!({
            "id": "m2",
            "payload": {"mimeType": "text/html", "body": {"data": encoded("<b>hi</b>")}}
        }))
        .into_message();
        assert_eq!(message.body_html.as_deref(), Some("<b>hi</b>"));
        assert_eq!(message.body_text, None);
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let headers = vec![GmailMessageHeader {
            name: "sUbJeCt".to_string(),
            value: "case test".to_string(),
        }];

        assert_eq!(
            header_value(&headers, "Subject").as_deref(),
            Some("case test")
        );
    }

    #[test]
    fn maps_unauthorized_as_auth_error() {
        let error = map_api_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );

        match error {
            AppError::Auth(message) => {
                assert!(message.contains("invalid authentication credentials"));
            }
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[test]
    fn maps_not_found_as_not_found_error() {
        let error = map_api_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#,
        );

        match error {
            AppError::NotFound(message) => {
                assert!(message.contains("Requested entity was not found"));
            }
            other => panic!("expected not found error, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body_for_unknown_errors() {
        let error = map_api_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(error.to_string().contains("upstream down"));
    }
}
