use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub in_reply_to: Option<String>,
    pub references: Option<String>,
}

/// Renders a plain-text RFC 822 message, base64url-encoded for Gmail's `raw`.
pub fn build_raw_message(message: &OutgoingMessage) -> String {
    let mut headers = Vec::new();

    let to = sanitize_header_value(&message.to);
    if !to.is_empty() {
        headers.push(format!("To: {to}"));
    }
    headers.push(format!(
        "Subject: {}",
        sanitize_header_value(&message.subject)
    ));
    if let Some(in_reply_to) = message.in_reply_to.as_deref().map(sanitize_header_value) {
        headers.push(format!("In-Reply-To: {in_reply_to}"));
    }
    if let Some(references) = message.references.as_deref().map(sanitize_header_value) {
        headers.push(format!("References: {references}"));
    }
    headers.push("MIME-Version: 1.0".to_string());
    headers.push("Content-Type: text/plain; charset=utf-8".to_string());

    let body = message.body.replace("\r\n", "\n").replace('\n', "\r\n");
    let payload = format!("{}\r\n\r\n{}", headers.join("\r\n"), body);
    URL_SAFE_NO_PAD.encode(payload.as_bytes())
}

pub fn decode_body_data(data: &str) -> AppResult<String> {
    let bytes = if data.ends_with('=') {
        URL_SAFE.decode(data)
    } else {
        URL_SAFE_NO_PAD.decode(data)
    }
    .map_err(|err| AppError::Api(format!("undecodable message body: {err}")))?;

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Appends `message_id` to an existing References chain unless present.
pub fn merge_references(existing: Option<&str>, message_id: Option<&str>) -> Option<String> {
    let message_id = message_id.map(str::trim).filter(|id| !id.is_empty())?;

    let mut refs = existing
        .unwrap_or_default()
        .split_whitespace()
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if !refs.iter().any(|value| value == message_id) {
        refs.push(message_id.to_string());
    }

    Some(refs.join(" "))
}

fn sanitize_header_value(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|value| *value != '\r' && *value != '\n')
        .collect()
}
