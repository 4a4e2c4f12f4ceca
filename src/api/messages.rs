use super::models::ListRequest;

const USER_ROOT: &str = "/gmail/v1/users/me";

pub fn message_endpoint(id: &str) -> String {
    format!("{USER_ROOT}/messages/{id}")
}

pub fn list_endpoint() -> String {
    format!("{USER_ROOT}/messages")
}

pub fn send_endpoint() -> String {
    format!("{USER_ROOT}/messages/send")
}

pub fn trash_endpoint(id: &str) -> String {
    format!("{USER_ROOT}/messages/{id}/trash")
}

pub fn modify_endpoint(id: &str) -> String {
    format!("{USER_ROOT}/messages/{id}/modify")
}

pub fn drafts_endpoint() -> String {
    format!("{USER_ROOT}/drafts")
}

pub fn thread_endpoint(id: &str) -> String {
    format!("{USER_ROOT}/threads/{id}")
}

pub fn profile_endpoint() -> String {
    format!("{USER_ROOT}/profile")
}

pub fn full_query() -> Vec<(String, String)> {
    vec![("format".to_string(), "full".to_string())]
}

/// Metadata fetch used to thread a reply onto its parent.
pub fn threading_query() -> Vec<(String, String)> {
    let mut query = vec![("format".to_string(), "metadata".to_string())];
    for header in ["Message-ID", "References"] {
        query.push(("metadataHeaders".to_string(), header.to_string()));
    }
    query
}

pub fn list_query(request: &ListRequest) -> Vec<(String, String)> {
    let mut params = vec![("maxResults".to_string(), request.max_results.to_string())];
    for label in &request.label_ids {
        params.push(("labelIds".to_string(), label.clone()));
    }
    if let Some(query) = &request.query {
        params.push(("q".to_string(), query.clone()));
    }
    if let Some(token) = &request.page_token {
        params.push(("pageToken".to_string(), token.clone()));
    }
    params
}

pub fn search_query(query: &str, max_results: u32) -> Vec<(String, String)> {
    vec![
        ("maxResults".to_string(), max_results.to_string()),
        ("q".to_string(), query.to_string()),
    ]
}
