use std::sync::Mutex;

use sportisode_types::*;

use super::lock;

/// Home feed as the UI renders it
#[derive(Debug, Clone, PartialEq)]
pub struct HomeFeedState {
    pub posts: Vec<FeedPost>,
    pub tab: FeedTab,
    /// Offset of the next page to request
    pub offset: usize,
    pub page_size: usize,
    pub has_next_page: bool,
    pub is_loading: bool,
    pub is_fetching_next_page: bool,
    pub error: Option<String>,
}

impl HomeFeedState {
    fn new(page_size: usize) -> Self {
        Self {
            posts: Vec::new(),
            tab: FeedTab::default(),
            offset: 0,
            page_size,
            has_next_page: true,
            is_loading: false,
            is_fetching_next_page: false,
            error: None,
        }
    }

    fn clear(&mut self) {
        self.posts.clear();
        self.offset = 0;
        self.has_next_page = true;
        self.error = None;
    }
}

/// Paged home feed for the active tab
#[derive(Debug)]
pub struct FeedStore {
    state: Mutex<HomeFeedState>,
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new(10)
    }
}

impl FeedStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            state: Mutex::new(HomeFeedState::new(page_size)),
        }
    }

    pub fn state(&self) -> HomeFeedState {
        lock(&self.state).clone()
    }

    pub fn page_size(&self) -> usize {
        lock(&self.state).page_size
    }

    /// Switching tabs throws away the current posts
    pub fn set_active_tab(&self, tab: FeedTab) {
        let mut state = lock(&self.state);
        if state.tab != tab {
            state.tab = tab;
            state.clear();
        }
    }

    pub fn clear_feed(&self) {
        lock(&self.state).clear();
    }

    /// Start a first-page load for `tab`. Returns the page size to request.
    pub fn begin_load(&self, tab: FeedTab) -> usize {
        let mut state = lock(&self.state);
        if state.tab != tab {
            state.tab = tab;
            state.clear();
        }
        state.is_loading = true;
        state.error = None;
        state.page_size
    }

    /// Start loading the next page. `None` when there is nothing more to
    /// fetch or a load is already running.
    pub fn begin_load_more(&self) -> Option<(FeedTab, usize, usize)> {
        let mut state = lock(&self.state);
        if !state.has_next_page || state.is_loading || state.is_fetching_next_page {
            return None;
        }
        state.is_fetching_next_page = true;
        state.error = None;
        Some((state.tab, state.offset, state.page_size))
    }

    /// Apply a fetched page. Pages for a tab that is no longer active are
    /// dropped.
    pub fn finish_load(&self, tab: FeedTab, page: FeedPage<FeedPost>, load_more: bool) -> bool {
        let mut state = lock(&self.state);
        if state.tab != tab {
            return false;
        }
        state.is_loading = false;
        state.is_fetching_next_page = false;

        if load_more {
            state.posts.extend(page.results);
        } else {
            state.posts = page.results;
        }
        state.offset = page.next_offset;
        state.has_next_page = page.has_next_page;
        true
    }

    pub fn fail_load(&self, tab: FeedTab, error: impl Into<String>) {
        let mut state = lock(&self.state);
        if state.tab != tab {
            return;
        }
        state.is_loading = false;
        state.is_fetching_next_page = false;
        state.error = Some(error.into());
    }

    /// Merge pushed counters into a post already in the feed
    pub fn update_post_in_feed(&self, post_id: PostId, patch: &InteractionPatch) -> bool {
        let mut state = lock(&self.state);
        let Some(post) = state.posts.iter_mut().find(|post| post.post_id() == Some(post_id)) else {
            return false;
        };

        if let Some(is_liked) = patch.is_liked {
            post.is_liked = is_liked;
        }
        if let Some(likes_count) = patch.likes_count {
            post.likes_count = likes_count;
        }
        if let Some(is_reposted) = patch.is_reposted {
            post.is_reposted = is_reposted;
        }
        if let Some(reposts_count) = patch.reposts_count {
            post.reposts_count = reposts_count;
        }
        if let Some(is_bookmarked) = patch.is_bookmarked {
            post.is_bookmarked = is_bookmarked;
        }
        if let Some(views_count) = patch.views_count {
            post.views_count = views_count;
        }
        true
    }

    /// New posts go to the top
    pub fn add_post_to_feed(&self, post: FeedPost) {
        lock(&self.state).posts.insert(0, post);
    }

    pub fn remove_post_from_feed(&self, post_id: PostId) -> bool {
        let mut state = lock(&self.state);
        let before = state.posts.len();
        state.posts.retain(|post| post.post_id() != Some(post_id));
        state.posts.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: i64) -> FeedPost {
        serde_json::from_value(json!({
            "id": id,
            "author": {"id": 1, "username": "striker"},
            "content": format!("post {}", id),
            "likes_count": 1
        }))
        .unwrap()
    }

    fn page(ids: std::ops::Range<i64>, offset: usize, page_size: usize) -> FeedPage<FeedPost> {
        ListResponse::Bare(ids.map(post).collect()).into_page(offset, page_size)
    }

    #[test]
    fn test_first_load_then_load_more() {
        let store = FeedStore::new(10);

        assert_eq!(store.begin_load(FeedTab::ForYou), 10);
        assert!(store.state().is_loading);
        assert!(store.finish_load(FeedTab::ForYou, page(0..10, 0, 10), false));

        let state = store.state();
        assert_eq!(state.posts.len(), 10);
        assert_eq!(state.offset, 10);
        assert!(state.has_next_page);
        assert!(!state.is_loading);

        let (tab, offset, limit) = store.begin_load_more().unwrap();
        assert_eq!((tab, offset, limit), (FeedTab::ForYou, 10, 10));
        assert!(store.begin_load_more().is_none());

        store.finish_load(FeedTab::ForYou, page(10..14, 10, 10), true);
        let state = store.state();
        assert_eq!(state.posts.len(), 14);
        assert_eq!(state.offset, 20);
        assert!(!state.has_next_page);
        assert!(store.begin_load_more().is_none());
    }

    #[test]
    fn test_switching_tab_resets_and_drops_stale_pages() {
        let store = FeedStore::new(10);
        store.begin_load(FeedTab::ForYou);
        store.finish_load(FeedTab::ForYou, page(0..10, 0, 10), false);

        store.set_active_tab(FeedTab::Following);
        let state = store.state();
        assert!(state.posts.is_empty());
        assert_eq!(state.offset, 0);
        assert!(state.has_next_page);

        assert!(!store.finish_load(FeedTab::ForYou, page(0..3, 0, 10), false));
        assert!(store.state().posts.is_empty());
    }

    #[test]
    fn test_fail_load_records_error() {
        let store = FeedStore::new(10);
        store.begin_load(FeedTab::ForYou);
        store.fail_load(FeedTab::ForYou, "Server returned 500");

        let state = store.state();
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some("Server returned 500"));
    }

    #[test]
    fn test_live_helpers() {
        let store = FeedStore::new(10);
        store.add_post_to_feed(post(1));
        store.add_post_to_feed(post(2));
        assert_eq!(store.state().posts[0].post_id(), Some(2));

        assert!(store.update_post_in_feed(
            1,
            &InteractionPatch {
                likes_count: Some(30),
                ..Default::default()
            }
        ));
        assert_eq!(store.state().posts[1].likes_count, 30);
        assert!(!store.update_post_in_feed(9, &InteractionPatch::default()));

        assert!(store.remove_post_from_feed(2));
        assert!(!store.remove_post_from_feed(2));
        assert_eq!(store.state().posts.len(), 1);
    }
}
