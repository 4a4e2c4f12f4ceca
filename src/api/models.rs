use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub thread_id: String,
    pub label_ids: Vec<String>,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub internal_date: Option<DateTime<Utc>>,
    pub snippet: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub is_read: bool,
    pub has_attachments: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRequest {
    pub label_ids: Vec<String>,
    pub query: Option<String>,
    pub page_token: Option<String>,
    pub max_results: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Draft {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub thread_id: Option<String>,
}

impl Draft {
    pub fn is_blank(&self) -> bool {
        self.to.trim().is_empty() && self.subject.trim().is_empty() && self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReceipt {
    pub id: String,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub email_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContext {
    pub current_view: String,
    pub current_email: Option<CurrentEmail>,
    pub emails: Vec<EmailSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentEmail {
    pub id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub body_text: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSummary {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
    pub date: String,
    pub is_read: bool,
}

impl From<&Message> for EmailSummary {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            subject: message.subject.clone(),
            sender: message.from.clone(),
            snippet: message.snippet.clone(),
            date: message.date.clone(),
            is_read: message.is_read,
        }
    }
}

impl From<&Message> for CurrentEmail {
    fn from(message: &Message) -> Self {
        let body_text = message
            .body_text
            .clone()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| message.snippet.clone());

        Self {
            id: message.id.clone(),
            from: message.from.clone(),
            subject: message.subject.clone(),
            snippet: message.snippet.clone(),
            body_text,
            date: message.date.clone(),
        }
    }
}

/// `action` stays raw JSON until the engine decodes it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub action: Option<serde_json::Value>,
}
