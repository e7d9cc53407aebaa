use std::sync::Arc;

use crate::api::SocialApi;
use crate::config::Settings;
use crate::logging::LogConfig;
use crate::search::SearchController;
use crate::store::{CommentStore, FeedStore, InteractionStore};

/// The client core: one API port and the stores it feeds.
///
/// Cloning is cheap and every clone shares the same stores, so a clone can
/// be moved into a spawned task.
#[derive(Clone)]
pub struct App {
    pub api: Arc<dyn SocialApi>,
    pub interactions: Arc<InteractionStore>,
    pub comments: Arc<CommentStore>,
    pub feed: Arc<FeedStore>,
    pub search: Arc<SearchController>,
    pub replies_page_size: usize,
    pub log_config: LogConfig,
}

impl App {
    pub fn new(api: Arc<dyn SocialApi>, settings: &Settings) -> Self {
        Self {
            api,
            interactions: Arc::new(InteractionStore::new(settings.view_cooldown())),
            comments: Arc::new(CommentStore::new()),
            feed: Arc::new(FeedStore::new(settings.feed.page_size)),
            search: Arc::new(SearchController::new()),
            replies_page_size: settings.replies.page_size,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }
}
