use std::sync::Mutex;

use sportisode_types::{SearchResults, SearchType};
use tokio_util::sync::CancellationToken;

use crate::store::lock;

/// What the search screen shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub search_type: SearchType,
    pub results: Option<SearchResults>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Handle for one issued search. Its results are only accepted while it is
/// the latest search.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl SearchTicket {
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[derive(Debug, Default)]
struct SearchInner {
    state: SearchState,
    current: Option<CancellationToken>,
    generation: u64,
}

/// Search with last-request-wins semantics: issuing a search cancels the
/// one in flight, and a superseded search never writes results.
#[derive(Debug, Default)]
pub struct SearchController {
    inner: Mutex<SearchInner>,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SearchState {
        lock(&self.inner).state.clone()
    }

    /// Cancel whatever is running and start a new search. An empty query
    /// just clears the results and yields no ticket.
    pub fn begin(&self, query: &str, search_type: SearchType) -> Option<SearchTicket> {
        let mut inner = lock(&self.inner);
        if let Some(previous) = inner.current.take() {
            previous.cancel();
        }
        inner.generation += 1;

        let query = query.trim();
        inner.state.query = query.to_string();
        inner.state.search_type = search_type;
        inner.state.error = None;

        if query.is_empty() {
            inner.state.results = None;
            inner.state.is_loading = false;
            return None;
        }

        let cancel = CancellationToken::new();
        inner.current = Some(cancel.clone());
        inner.state.is_loading = true;
        Some(SearchTicket {
            generation: inner.generation,
            cancel,
        })
    }

    fn is_current(inner: &SearchInner, ticket: &SearchTicket) -> bool {
        inner.generation == ticket.generation && !ticket.cancel.is_cancelled()
    }

    pub fn finish(&self, ticket: &SearchTicket, results: SearchResults) -> bool {
        let mut inner = lock(&self.inner);
        if !Self::is_current(&inner, ticket) {
            return false;
        }
        inner.current = None;
        inner.state.results = Some(results);
        inner.state.is_loading = false;
        true
    }

    pub fn fail(&self, ticket: &SearchTicket, error: impl Into<String>) -> bool {
        let mut inner = lock(&self.inner);
        if !Self::is_current(&inner, ticket) {
            return false;
        }
        inner.current = None;
        inner.state.error = Some(error.into());
        inner.state.is_loading = false;
        true
    }

    /// Cancel any running search and forget the results
    pub fn clear(&self) {
        let mut inner = lock(&self.inner);
        if let Some(previous) = inner.current.take() {
            previous.cancel();
        }
        inner.generation += 1;
        inner.state = SearchState::default();
    }
}
