//! Cursor slot 0 is always `None`. Slot `p + 1` is filled only after page `p`
//! reported a continuation token. Changing the remote query drops every slot
//! but 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::models::{ListRequest, Message, MessagePage, Profile};

const ARCHIVE_BASE_QUERY: &str = "-in:inbox -in:trash -in:spam";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Inbox,
    Sent,
    Trash,
    Archive,
    Drafts,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Inbox,
        View::Sent,
        View::Trash,
        View::Archive,
        View::Drafts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            View::Inbox => "inbox",
            View::Sent => "sent",
            View::Trash => "trash",
            View::Archive => "archive",
            View::Drafts => "drafts",
        }
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            View::Inbox => Some("INBOX"),
            View::Sent => Some("SENT"),
            View::Trash => Some("TRASH"),
            View::Drafts => Some("DRAFT"),
            View::Archive => None,
        }
    }

    pub fn base_query(self) -> Option<&'static str> {
        match self {
            View::Archive => Some(ARCHIVE_BASE_QUERY),
            _ => None,
        }
    }

    pub fn route(self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim();
        View::ALL
            .into_iter()
            .find(|view| view.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("unknown view `{needle}`"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    pub query: Option<String>,
    pub label_ids: Vec<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub is_unread: Option<bool>,
}

impl Filter {
    pub fn for_view(view: View) -> Self {
        Self {
            label_ids: view.label().map(str::to_string).into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn to_query(&self, view: View) -> Option<String> {
        let mut terms = Vec::new();

        if let Some(base) = view.base_query() {
            terms.push(base.to_string());
        }
        if let Some(query) = non_blank(self.query.as_deref()) {
            terms.push(query.to_string());
        }

        for (operator, value) in [
            ("from", &self.from),
            ("to", &self.to),
            ("subject", &self.subject),
            ("after", &self.after),
            ("before", &self.before),
        ] {
            if let Some(value) = non_blank(value.as_deref()) {
                terms.push(format!("{operator}:{value}"));
            }
        }

        if self.is_unread == Some(true) {
            terms.push("is:unread".to_string());
        }

        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" "))
        }
    }
}

/// A fragment shallow-merged into [`Filter`]: present fields override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPatch {
    #[serde(default, alias = "q", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_unread: Option<bool>,
}

impl FilterPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_date_bounds(&self) -> bool {
        self.after.is_some() || self.before.is_some()
    }

    pub fn take_date_bounds(&mut self) -> DateRange {
        DateRange {
            from: self.after.take(),
            to: self.before.take(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pagination {
    current_page: usize,
    cursors: Vec<Option<String>>,
    next_cursor: Option<String>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 0,
            cursors: vec![None],
            next_cursor: None,
        }
    }
}

/// Results are applied only while the ticket is the latest one issued and
/// the remote query is unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    epoch: u64,
    seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MailboxState {
    messages: Vec<Message>,
    selected_id: Option<String>,
    filter: Filter,
    date_range: DateRange,
    view: View,
    pagination: Pagination,
    loading: bool,
    profile: Option<Profile>,
    query_epoch: u64,
    fetch_seq: u64,
}

impl Default for MailboxState {
    fn default() -> Self {
        Self::new()
    }
}

impl MailboxState {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            selected_id: None,
            filter: Filter::for_view(View::Inbox),
            date_range: DateRange::default(),
            view: View::Inbox,
            pagination: Pagination::default(),
            loading: false,
            profile: None,
            query_epoch: 0,
            fetch_seq: 0,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected(&self) -> Option<&Message> {
        self.selected_id.as_deref().and_then(|id| self.message(id))
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn date_range(&self) -> &DateRange {
        &self.date_range
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn current_page(&self) -> usize {
        self.pagination.current_page
    }

    pub fn cursor_chain(&self) -> &[Option<String>] {
        &self.pagination.cursors
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.pagination.next_cursor.as_deref()
    }

    pub fn has_next_page(&self) -> bool {
        self.known_cursor(self.pagination.current_page + 1)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Replaces the cached collection with a fetched one. A message already
    /// read locally stays read even when the fetched copy says unread.
    pub fn replace_messages(&mut self, fetched: Vec<Message>) {
        let merged: Vec<Message> = fetched
            .into_iter()
            .map(|mut incoming| {
                let read_locally = self
                    .message(&incoming.id)
                    .is_some_and(|cached| cached.is_read);
                if read_locally {
                    incoming.is_read = true;
                }
                incoming
            })
            .collect();
        self.messages = merged;
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected_id = id;
    }

    /// Shallow-merges `patch` into the filter. Date bounds in the patch are
    /// mirrored into the date range. Any effective change resets pagination.
    pub fn merge_filter(&mut self, patch: FilterPatch) {
        let mut next = self.filter.clone();
        let FilterPatch {
            query,
            label_ids,
            from,
            to,
            subject,
            after,
            before,
            is_unread,
        } = patch;

        if query.is_some() {
            next.query = query;
        }
        if let Some(label_ids) = label_ids {
            next.label_ids = label_ids;
        }
        if from.is_some() {
            next.from = from;
        }
        if to.is_some() {
            next.to = to;
        }
        if subject.is_some() {
            next.subject = subject;
        }
        if after.is_some() {
            next.after = after;
        }
        if before.is_some() {
            next.before = before;
        }
        if is_unread.is_some() {
            next.is_unread = is_unread;
        }

        if next == self.filter {
            return;
        }

        self.date_range = DateRange {
            from: next.after.clone(),
            to: next.before.clone(),
        };
        self.filter = next;
        self.reset_pagination();
    }

    pub fn clear_filters(&mut self) {
        self.filter = Filter::for_view(self.view);
        self.date_range = DateRange::default();
        self.reset_pagination();
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.filter = Filter {
            after: self.date_range.from.clone(),
            before: self.date_range.to.clone(),
            ..Filter::for_view(view)
        };
        self.reset_pagination();
    }

    pub fn set_date_range(&mut self, from: Option<String>, to: Option<String>) {
        self.filter.after = from.clone();
        self.filter.before = to.clone();
        self.date_range = DateRange { from, to };
        self.reset_pagination();
    }

    pub fn next_page(&mut self) -> bool {
        let target = self.pagination.current_page + 1;
        self.go_to_page(target)
    }

    pub fn prev_page(&mut self) -> bool {
        match self.pagination.current_page.checked_sub(1) {
            Some(target) => self.go_to_page(target),
            None => false,
        }
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        if page == self.pagination.current_page {
            return true;
        }
        if page != 0 && !self.known_cursor(page) {
            return false;
        }

        self.pagination.current_page = page;
        self.pagination.next_cursor = None;
        self.query_epoch += 1;
        true
    }

    /// Records the continuation token reported for the current page. The
    /// first token recorded for a slot wins.
    pub fn record_next_cursor(&mut self, token: Option<String>) {
        self.pagination.next_cursor = token.clone();

        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return;
        };

        let slot = self.pagination.current_page + 1;
        let cursors = &mut self.pagination.cursors;
        if cursors.len() <= slot {
            cursors.resize(slot + 1, None);
        }
        if cursors[slot].is_none() {
            cursors[slot] = Some(token);
        }
    }

    /// Returns the old position for `restore_message`.
    pub fn remove_message(&mut self, id: &str) -> Option<(usize, Message)> {
        let index = self.messages.iter().position(|message| message.id == id)?;
        let removed = self.messages.remove(index);

        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }

        Some((index, removed))
    }

    pub fn restore_message(&mut self, index: usize, message: Message) {
        if self.message(&message.id).is_some() {
            return;
        }
        let index = index.min(self.messages.len());
        self.messages.insert(index, message);
    }

    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.messages.iter_mut().find(|message| message.id == id) {
            Some(message) if !message.is_read => {
                message.is_read = true;
                true
            }
            _ => false,
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_profile(&mut self, profile: Option<Profile>) {
        self.profile = profile;
    }

    pub fn list_request(&self, max_results: u32) -> ListRequest {
        let page = self.pagination.current_page;
        ListRequest {
            label_ids: self.filter.label_ids.clone(),
            query: self.filter.to_query(self.view),
            page_token: self.pagination.cursors.get(page).cloned().flatten(),
            max_results,
        }
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_seq += 1;
        self.loading = true;
        FetchTicket {
            epoch: self.query_epoch,
            seq: self.fetch_seq,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.seq == self.fetch_seq && ticket.epoch == self.query_epoch
    }

    pub fn apply_page(&mut self, ticket: FetchTicket, page: MessagePage) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.replace_messages(page.messages);
        self.record_next_cursor(page.next_cursor);
        self.loading = false;
        true
    }

    /// No read merge: search results are not a page of the view.
    pub fn apply_search_results(&mut self, ticket: FetchTicket, results: Vec<Message>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }

        self.messages = results;
        self.loading = false;
        true
    }

    pub fn finish_fetch(&mut self, ticket: FetchTicket) {
        if ticket.seq == self.fetch_seq {
            self.loading = false;
        }
    }

    fn known_cursor(&self, page: usize) -> bool {
        matches!(self.pagination.cursors.get(page), Some(Some(_)))
    }

    fn reset_pagination(&mut self) {
        self.pagination = Pagination::default();
        self.query_epoch += 1;
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: &str, is_read: bool) -> Message {
        Message {
            id: id.to_string(),
            thread_id: format!("t-{id}"),
            label_ids: vec!["INBOX".to_string()],
            from: "Jane Doe <jane@x.com>".to_string(),
            to: "me@x.com".to_string(),
            subject: "Budget".to_string(),
            date: "Mon, 16 Feb 2026 10:00:00 +0000".to_string(),
            internal_date: None,
            snippet: "numbers".to_string(),
            body_text: None,
            body_html: None,
            is_read,
            has_attachments: false,
        }
    }

    fn paged_state() -> MailboxState {
        let mut state = MailboxState::new();
        state.record_next_cursor(Some("p1".to_string()));
        assert!(state.next_page());
        state.record_next_cursor(Some("p2".to_string()));
        assert!(state.next_page());
        state
    }

    fn assert_pagination_reset(state: &MailboxState) {
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.cursor_chain(), &[None]);
        assert_eq!(state.next_cursor(), None);
    }

    #[test]
    fn starts_on_inbox_label() {
        let state = MailboxState::new();
        assert_eq!(state.view(), View::Inbox);
        assert_eq!(state.filter().label_ids, ["INBOX"]);
        assert_pagination_reset(&state);
    }

    #[test]
    fn cached_read_flag_survives_stale_fetch() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", true), message("b", false)]);

        state.replace_messages(vec![message("a", false), message("b", true)]);

        assert!(state.message("a").expect("a cached").is_read);
        assert!(state.message("b").expect("b cached").is_read);
    }

    #[test]
    fn fetch_replaces_collection_wholesale() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", false)]);
        state.replace_messages(vec![message("b", false)]);
        assert!(state.message("a").is_none());
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn cursor_is_recorded_once_per_page() {
        let mut state = MailboxState::new();
        state.record_next_cursor(Some("first".to_string()));
        state.record_next_cursor(Some("second".to_string()));

        assert_eq!(state.cursor_chain()[1].as_deref(), Some("first"));
        assert_eq!(state.next_cursor(), Some("second"));
    }

    #[test]
    fn cannot_advance_without_a_cursor() {
        let mut state = MailboxState::new();
        assert!(!state.next_page());
        assert!(!state.go_to_page(3));
        assert_eq!(state.current_page(), 0);

        state.record_next_cursor(None);
        assert!(!state.has_next_page());
    }

    #[test]
    fn walks_back_along_the_chain() {
        let mut state = paged_state();
        assert_eq!(state.current_page(), 2);
        assert!(state.prev_page());
        assert!(state.prev_page());
        assert!(!state.prev_page());
        assert_eq!(state.current_page(), 0);
        assert_eq!(state.list_request(10).page_token, None);
        assert!(state.next_page());
        assert_eq!(state.list_request(10).page_token.as_deref(), Some("p1"));
    }

    #[test]
    fn view_change_resets_pagination_and_filter() {
        let mut state = paged_state();
        state.merge_filter(FilterPatch {
            from: Some("jane".to_string()),
            ..FilterPatch::default()
        });
        state.set_view(View::Sent);

        assert_pagination_reset(&state);
        assert_eq!(state.filter(), &Filter::for_view(View::Sent));
    }

    #[test]
    fn view_change_keeps_date_range_in_filter() {
        let mut state = MailboxState::new();
        state.set_date_range(Some("2026/01/01".to_string()), None);
        state.set_view(View::Archive);

        assert_eq!(state.filter().after.as_deref(), Some("2026/01/01"));
        assert_eq!(state.date_range().from.as_deref(), Some("2026/01/01"));
        assert!(state.filter().label_ids.is_empty());
    }

    #[test]
    fn query_change_resets_pagination() {
        let mut state = paged_state();
        state.merge_filter(FilterPatch {
            query: Some("invoice".to_string()),
            ..FilterPatch::default()
        });
        assert_pagination_reset(&state);
        assert_eq!(state.filter().query.as_deref(), Some("invoice"));
        assert_eq!(state.filter().label_ids, ["INBOX"]);
    }

    #[test]
    fn date_range_change_resets_pagination_and_syncs_filter() {
        let mut state = paged_state();
        state.set_date_range(
            Some("2026/01/01".to_string()),
            Some("2026/02/01".to_string()),
        );
        assert_pagination_reset(&state);
        assert_eq!(state.filter().before.as_deref(), Some("2026/02/01"));
    }

    #[test]
    fn noop_merge_keeps_pagination() {
        let mut state = paged_state();
        state.merge_filter(FilterPatch::default());
        assert_eq!(state.current_page(), 2);
    }

    #[test]
    fn merged_date_bounds_mirror_into_range() {
        let mut state = MailboxState::new();
        state.merge_filter(FilterPatch {
            before: Some("2026/03/01".to_string()),
            ..FilterPatch::default()
        });
        assert_eq!(state.date_range().to.as_deref(), Some("2026/03/01"));
        assert_eq!(state.date_range().from, None);
    }

    #[test]
    fn clear_filters_returns_to_view_base() {
        let mut state = paged_state();
        state.set_view(View::Trash);
        state.merge_filter(FilterPatch {
            query: Some("x".to_string()),
            is_unread: Some(true),
            ..FilterPatch::default()
        });
        state.set_date_range(Some("2026/01/01".to_string()), None);

        state.clear_filters();

        assert_eq!(state.filter(), &Filter::for_view(View::Trash));
        assert!(state.date_range().is_empty());
        assert_pagination_reset(&state);
    }

    #[test]
    fn removing_selected_message_clears_selection() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", false), message("b", false)]);
        state.select(Some("a".to_string()));

        state.remove_message("b");
        assert_eq!(state.selected_id(), Some("a"));

        let (index, removed) = state.remove_message("a").expect("a present");
        assert_eq!(index, 0);
        assert_eq!(removed.id, "a");
        assert_eq!(state.selected_id(), None);
        assert!(state.remove_message("missing").is_none());
    }

    #[test]
    fn restore_puts_message_back_in_place() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", false), message("b", false)]);
        let (index, removed) = state.remove_message("a").expect("a present");

        state.restore_message(index, removed.clone());
        state.restore_message(index, removed);

        let ids: Vec<_> = state.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn mark_read_reports_transition() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", false)]);
        assert!(state.mark_read("a"));
        assert!(!state.mark_read("a"));
        assert!(!state.mark_read("zzz"));
    }

    #[test]
    fn stale_page_is_discarded() {
        let mut state = MailboxState::new();
        let stale = state.begin_fetch();
        state.set_view(View::Sent);
        let fresh = state.begin_fetch();

        let applied = state.apply_page(
            stale,
            MessagePage {
                messages: vec![message("old", false)],
                next_cursor: Some("old-cursor".to_string()),
            },
        );
        assert!(!applied);
        assert!(state.messages().is_empty());
        assert!(state.is_loading());

        assert!(state.apply_page(
            fresh,
            MessagePage {
                messages: vec![message("new", false)],
                next_cursor: None,
            },
        ));
        assert_eq!(state.messages()[0].id, "new");
        assert!(!state.is_loading());
    }

    #[test]
    fn overlapping_fetch_for_same_query_keeps_latest() {
        let mut state = MailboxState::new();
        let first = state.begin_fetch();
        let second = state.begin_fetch();
        assert!(!state.is_current(first));
        assert!(state.is_current(second));
    }

    #[test]
    fn search_results_replace_without_merge() {
        let mut state = MailboxState::new();
        state.replace_messages(vec![message("a", true)]);
        let ticket = state.begin_fetch();

        assert!(state.apply_search_results(ticket, vec![message("a", false)]));
        assert!(!state.message("a").expect("a present").is_read);
    }

    #[test]
    fn builds_gmail_query_from_filter() {
        let filter = Filter {
            query: Some("invoice".to_string()),
            from: Some("jane@x.com".to_string()),
            after: Some("2026/01/01".to_string()),
            is_unread: Some(true),
            ..Filter::default()
        };
        assert_eq!(
            filter.to_query(View::Inbox).as_deref(),
            Some("invoice from:jane@x.com after:2026/01/01 is:unread")
        );
        assert_eq!(
            Filter::default().to_query(View::Archive).as_deref(),
            Some("-in:inbox -in:trash -in:spam")
        );
        assert_eq!(Filter::for_view(View::Inbox).to_query(View::Inbox), None);
    }

    #[test]
    fn parses_view_names() {
        assert_eq!("Drafts".parse::<View>(), Ok(View::Drafts));
        assert!("compose".parse::<View>().is_err());
    }

    #[test]
    fn patch_accepts_gmail_style_alias() {
        let patch: FilterPatch =
            serde_json::from_str(r#"{"q":"lunch","isUnread":true,"extra":1}"#)
                .expect("patch parse");
        assert_eq!(patch.query.as_deref(), Some("lunch"));
        assert_eq!(patch.is_unread, Some(true));
    }
}
