use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::state::{FilterPatch, View};

pub const KNOWN_TYPES: &[&str] = &[
    "compose",
    "reply",
    "navigate",
    "search",
    "gmail_search",
    "filter",
    "clear_filters",
    "open_email",
    "send",
    "save_draft",
    "summarize",
    "logout",
    "discard_compose",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Compose {
        #[serde(default, deserialize_with = "lenient_string")]
        to: String,
        #[serde(default, deserialize_with = "lenient_string")]
        subject: String,
        #[serde(default, deserialize_with = "lenient_string")]
        body: String,
    },
    Reply {
        #[serde(rename = "emailId", default, deserialize_with = "lenient_string")]
        email_id: String,
        #[serde(default, deserialize_with = "lenient_string")]
        body: String,
    },
    Navigate {
        view: NavTarget,
    },
    Search {
        #[serde(default, deserialize_with = "lenient_string")]
        query: String,
        #[serde(default)]
        filters: Option<FilterPatch>,
    },
    GmailSearch {
        query: String,
    },
    Filter {
        #[serde(default)]
        filters: Option<FilterPatch>,
    },
    ClearFilters {},
    OpenEmail {
        #[serde(rename = "emailId", default, deserialize_with = "lenient_string")]
        email_id: String,
    },
    Send {},
    SaveDraft {},
    Summarize {
        #[serde(rename = "emailIds", default, skip_serializing_if = "Option::is_none")]
        email_ids: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    Logout {},
    DiscardCompose {
        #[serde(rename = "needsConfirmation", default)]
        needs_confirmation: bool,
        #[serde(rename = "saveDraft", default)]
        save_draft: bool,
    },
}

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("action has no `type` tag")]
    MissingType,
    #[error("unknown action type `{0}`")]
    UnknownVariant(String),
    #[error("malformed `{kind}` action: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Action {
    pub fn from_value(value: Value) -> Result<Self, ActionError> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ActionError::MissingType)?
            .to_string();

        if !KNOWN_TYPES.contains(&kind.as_str()) {
            return Err(ActionError::UnknownVariant(kind));
        }

        serde_json::from_value(value).map_err(|source| ActionError::Malformed { kind, source })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Compose { .. } => "compose",
            Action::Reply { .. } => "reply",
            Action::Navigate { .. } => "navigate",
            Action::Search { .. } => "search",
            Action::GmailSearch { .. } => "gmail_search",
            Action::Filter { .. } => "filter",
            Action::ClearFilters {} => "clear_filters",
            Action::OpenEmail { .. } => "open_email",
            Action::Send {} => "send",
            Action::SaveDraft {} => "save_draft",
            Action::Summarize { .. } => "summarize",
            Action::Logout {} => "logout",
            Action::DiscardCompose { .. } => "discard_compose",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavTarget {
    Inbox,
    Sent,
    Trash,
    Archive,
    Drafts,
    Compose,
}

impl NavTarget {
    pub fn view(self) -> Option<View> {
        match self {
            NavTarget::Inbox => Some(View::Inbox),
            NavTarget::Sent => Some(View::Sent),
            NavTarget::Trash => Some(View::Trash),
            NavTarget::Archive => Some(View::Archive),
            NavTarget::Drafts => Some(View::Drafts),
            NavTarget::Compose => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self.view() {
            Some(view) => view.as_str(),
            None => "compose",
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
