//! Search overlay: the set of paths matching the live query.
//!
//! The overlay is `None` when no search is active, `Some(empty)` when the
//! last search found nothing (or failed) and a sorted set of paths otherwise.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::remote::api::Backend;
use crate::tree::path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Filename,
    Content,
}

impl SearchMode {
    pub fn toggled(self) -> Self {
        match self {
            SearchMode::Filename => SearchMode::Content,
            SearchMode::Content => SearchMode::Filename,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Filename => f.write_str("filename"),
            SearchMode::Content => f.write_str("content"),
        }
    }
}

/// Identifies one scheduled search. A result is only committed while its
/// ticket still matches the live mode and query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub mode: SearchMode,
    pub query: String,
}

/// Trimmed, and lower-cased for filename matching.
pub fn normalize_query(raw: &str, mode: SearchMode) -> String {
    let trimmed = raw.trim();
    match mode {
        SearchMode::Filename => trimmed.to_lowercase(),
        SearchMode::Content => trimmed.to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    mode: SearchMode,
    overlay: Option<BTreeSet<String>>,
}

impl SearchState {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// The query as typed.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn overlay(&self) -> Option<&BTreeSet<String>> {
        self.overlay.as_ref()
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Ticket for the live query, or `None` if it is blank.
    pub fn ticket(&self) -> Option<SearchTicket> {
        let query = normalize_query(&self.query, self.mode);
        (!query.is_empty()).then_some(SearchTicket {
            mode: self.mode,
            query,
        })
    }

    /// Update the query. A blank query drops the overlay immediately and
    /// yields no ticket; otherwise the returned ticket should be scheduled.
    pub fn set_query(&mut self, raw: &str) -> Option<SearchTicket> {
        self.query = raw.to_string();
        let ticket = self.ticket();
        if ticket.is_none() {
            self.overlay = None;
        }
        ticket
    }

    /// Switch between filename and content search. A non-empty query is
    /// searched again in the new mode.
    pub fn toggle_mode(&mut self) -> Option<SearchTicket> {
        self.mode = self.mode.toggled();
        self.ticket()
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.ticket().as_ref() == Some(ticket)
    }

    /// Commit a finished search. Stale results are dropped and `false` is
    /// returned. Failures leave an empty overlay.
    pub fn apply(
        &mut self,
        ticket: &SearchTicket,
        result: Result<BTreeSet<String>, SearchError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(mode = %ticket.mode, query = %ticket.query, "discarding stale search result");
            return false;
        }
        self.overlay = Some(result.unwrap_or_default());
        true
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.overlay = None;
    }
}

/// Flags forwarded to the backend for content search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub show_hidden: bool,
    pub case_sensitive: bool,
    pub use_regex: bool,
}

/// Run the backend request for `ticket` and reduce it to a path set.
pub async fn run_search<B: Backend>(
    backend: &B,
    ticket: &SearchTicket,
    options: SearchOptions,
) -> Result<BTreeSet<String>, SearchError> {
    let fail = |cause: String| SearchError {
        mode: ticket.mode,
        cause,
    };
    match ticket.mode {
        SearchMode::Filename => {
            let files = backend
                .list_files(options.show_hidden)
                .await
                .map_err(|e| fail(e.to_string()))?;
            Ok(files
                .into_iter()
                .filter(|f| f.name.to_lowercase().contains(&ticket.query))
                .map(|f| path::normalize(&f.path))
                .collect())
        }
        SearchMode::Content => {
            let matches = backend
                .global_search(&ticket.query, options.case_sensitive, options.use_regex)
                .await
                .map_err(|e| fail(e.to_string()))?;
            Ok(matches
                .into_iter()
                .map(|m| path::normalize(&m.path))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::mock::MockBackend;

    fn set(paths: &[&str]) -> BTreeSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn blank_query_clears_overlay_synchronously() {
        let mut state = SearchState::new(SearchMode::Filename);
        let ticket = state.set_query("main").unwrap();
        state.apply(&ticket, Ok(set(&["src/main.yaml"])));
        assert_eq!(state.overlay(), Some(&set(&["src/main.yaml"])));

        assert!(state.set_query("   ").is_none());
        assert!(state.overlay().is_none());
    }

    #[test]
    fn filename_ticket_is_trimmed_and_lowercased() {
        let mut state = SearchState::new(SearchMode::Filename);
        let ticket = state.set_query("  Main ").unwrap();
        assert_eq!(ticket.query, "main");

        state.toggle_mode();
        assert_eq!(state.ticket().unwrap().query, "Main");
    }

    #[test]
    fn superseded_query_is_discarded() {
        let mut state = SearchState::new(SearchMode::Content);
        let foo = state.set_query("foo").unwrap();
        let foobar = state.set_query("foobar").unwrap();

        assert!(state.apply(&foobar, Ok(set(&["b.yaml"]))));
        assert!(!state.apply(&foo, Ok(set(&["a.yaml"]))));
        assert_eq!(state.overlay(), Some(&set(&["b.yaml"])));
    }

    #[test]
    fn result_from_other_mode_is_discarded() {
        let mut state = SearchState::new(SearchMode::Filename);
        let filename = state.set_query("foo").unwrap();
        let content = state.toggle_mode().unwrap();
        assert_eq!(content.mode, SearchMode::Content);

        assert!(!state.apply(&filename, Ok(set(&["foo.yaml"]))));
        assert!(state.overlay().is_none());
    }

    #[test]
    fn failure_leaves_empty_overlay() {
        let mut state = SearchState::new(SearchMode::Content);
        let ticket = state.set_query("foo").unwrap();
        let err = SearchError {
            mode: SearchMode::Content,
            cause: "HTTP 500".into(),
        };
        assert!(state.apply(&ticket, Err(err)));
        assert_eq!(state.overlay(), Some(&BTreeSet::new()));
    }

    #[test]
    fn toggle_with_blank_query_yields_no_ticket() {
        let mut state = SearchState::new(SearchMode::Filename);
        assert!(state.toggle_mode().is_none());
        assert_eq!(state.mode(), SearchMode::Content);
    }

    #[tokio::test]
    async fn filename_search_matches_names_case_insensitively() {
        let backend = MockBackend::workspace();
        let ticket = SearchTicket {
            mode: SearchMode::Filename,
            query: normalize_query("MAIN", SearchMode::Filename),
        };
        let paths = run_search(&backend, &ticket, SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(paths, set(&["src/main.yaml"]));
        assert_eq!(backend.count("list_files"), 1);
    }

    #[tokio::test]
    async fn content_search_collects_match_paths() {
        let backend = MockBackend::workspace();
        backend.set_search_hits("trigger", vec!["b.yaml", "a.yaml", "b.yaml"]);
        let ticket = SearchTicket {
            mode: SearchMode::Content,
            query: "trigger".into(),
        };
        let paths = run_search(&backend, &ticket, SearchOptions::default())
            .await
            .unwrap();
        assert_eq!(paths.into_iter().collect::<Vec<_>>(), vec!["a.yaml", "b.yaml"]);
    }

    #[tokio::test]
    async fn backend_failure_is_search_error() {
        let backend = MockBackend::workspace();
        backend.fail("list_files");
        let ticket = SearchTicket {
            mode: SearchMode::Filename,
            query: "main".into(),
        };
        let err = run_search(&backend, &ticket, SearchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.mode, SearchMode::Filename);
        assert_eq!(err.cause, "HTTP 500");
    }
}
