use std::sync::LazyLock;

use regex::Regex;

use crate::api::models::Message;
use crate::state::DateRange;

const PREVIEW_LIMIT: usize = 120;

static AFTER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| super::pattern(r"(?i)after:(\d{4}/\d{2}/\d{2})"));
static BEFORE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| super::pattern(r"(?i)before:(\d{4}/\d{2}/\d{2})"));

/// `after:`/`before:` bounds embedded in a Gmail query string.
pub fn date_bounds(query: &str) -> DateRange {
    DateRange {
        from: first_capture(&AFTER_TOKEN, query),
        to: first_capture(&BEFORE_TOKEN, query),
    }
}

fn first_capture(pattern: &Regex, input: &str) -> Option<String> {
    pattern
        .captures(input)?
        .get(1)
        .map(|value| value.as_str().to_string())
}

pub fn results_digest(results: &[Message]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(index, message)| {
            format!(
                "{}. ID:{} | From: {} | Subject: {} | Date: {}\n   Preview: {}",
                index + 1,
                message.id,
                message.from,
                message.subject,
                message.date,
                compact_preview(&message.snippet),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn follow_up_prompt(query: &str, results: &[Message]) -> String {
    format!(
        "I searched the user's Gmail and found these results for \"{query}\":\n\n{}\n\n\
         Please summarize what was found and tell the user. Include the email IDs in your \
         context so the user can ask to open specific emails later. If any email closely \
         matches what they were looking for, mention it specifically with its details.",
        results_digest(results)
    )
}

pub fn no_results_message(query: &str) -> String {
    format!("I searched your entire mailbox for \"{query}\" but couldn't find any matching emails.")
}

pub fn fallback_summary(query: &str, count: usize) -> String {
    format!("Found {count} result(s) for \"{query}\".")
}

pub fn compact_preview(snippet: &str) -> String {
    let decoded = html_escape::decode_html_entities(snippet).to_string();
    let compact = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    if compact.len() <= PREVIEW_LIMIT {
        return compact;
    }

    let mut end = PREVIEW_LIMIT;
    while !compact.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &compact[..end])
}
