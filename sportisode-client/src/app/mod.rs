use sportisode_types::*;

use crate::api::{ApiError, ApiResult};
use crate::live::LiveUpdates;
use crate::store::ToggleOutcome;

pub mod state;
pub use state::*;


impl App {
    /// Seed interaction records for posts about to be shown
    pub fn initialize_feed_posts(&self, posts: &[FeedPost]) {
        for post in posts {
            if let Some(post_id) = post.post_id() {
                self.interactions.initialize(post_id, post.interaction_snapshot());
            }
        }
    }

    /// Optimistic flip, request, then confirm with the server's counts or
    /// revert and record the error under the kind
    async fn run_toggle(&self, kind: ToggleKind, post_id: PostId, comment: Option<String>) -> ApiResult<PostInteraction> {
        let attempt = self.interactions.optimistic_toggle(kind, post_id);
        log_interaction!(
            self.log_config,
            "{} post={} optimistic (was {})",
            kind.as_str(),
            post_id,
            attempt.previous()
        );

        let result = match kind {
            ToggleKind::Like => self.api.toggle_like(post_id).await.map(ToggleOutcome::Like),
            ToggleKind::Repost => self
                .api
                .create_repost(post_id, comment)
                .await
                .map(ToggleOutcome::Repost),
            ToggleKind::Bookmark => self
                .api
                .toggle_bookmark(post_id)
                .await
                .map(ToggleOutcome::Bookmark),
        };

        match result {
            Ok(outcome) => {
                self.interactions.confirm_toggle(attempt, &outcome);
                log_interaction!(self.log_config, "{} post={} confirmed", kind.as_str(), post_id);
                Ok(self.interactions.get(post_id))
            }
            Err(e) => {
                self.interactions.revert_toggle(attempt);
                self.interactions.record_error(kind.into(), e.to_string());
                log::warn!("{} on post {} failed, reverted: {}", kind.as_str(), post_id, e);
                Err(e)
            }
        }
    }

    pub async fn toggle_like(&self, post_id: PostId) -> ApiResult<PostInteraction> {
        self.run_toggle(ToggleKind::Like, post_id, None).await
    }

    /// Repost, optionally quoting with a comment
    pub async fn create_repost(&self, post_id: PostId, comment: Option<String>) -> ApiResult<PostInteraction> {
        self.run_toggle(ToggleKind::Repost, post_id, comment).await
    }

    pub async fn toggle_bookmark(&self, post_id: PostId) -> ApiResult<PostInteraction> {
        self.run_toggle(ToggleKind::Bookmark, post_id, None).await
    }

    /// Log a share to `platform` and raise the "copied" marker
    pub async fn share(&self, post_id: PostId, platform: &str) -> ApiResult<ShareResponse> {
        self.interactions.begin_mutation(MutationKind::Share, post_id);
        match self.api.log_share(post_id, platform).await {
            Ok(response) => {
                self.interactions.confirm_share(post_id, &response);
                self.interactions.mark_share_copied(post_id);
                log_interaction!(self.log_config, "share post={} platform={}", post_id, platform);
                Ok(response)
            }
            Err(e) => {
                self.interactions.fail_mutation(MutationKind::Share, post_id, e.to_string());
                Err(e)
            }
        }
    }

    /// Record a view unless one was recorded within the cooldown. Returns
    /// whether a request was made.
    pub async fn record_view(&self, post_id: PostId, view_type: ViewType) -> ApiResult<bool> {
        if !self.interactions.should_record_view(post_id) {
            log_interaction!(self.log_config, "view post={} skipped (cooldown)", post_id);
            return Ok(false);
        }

        self.interactions.begin_mutation(MutationKind::View, post_id);
        match self.api.record_view(post_id, view_type).await {
            Ok(()) => {
                self.interactions.confirm_view(post_id);
                Ok(true)
            }
            Err(e) => {
                self.interactions.fail_mutation(MutationKind::View, post_id, e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_comments(&self, post_id: PostId) -> ApiResult<()> {
        self.comments.begin_fetch(post_id);
        match self.api.fetch_comments(post_id).await {
            Ok(response) => {
                log_comments!(self.log_config, "post={} fetched {} comments", post_id, response.total());
                self.comments.finish_fetch(post_id, response);
                Ok(())
            }
            Err(e) => {
                self.comments.fail_fetch(post_id, e.to_string());
                Err(e)
            }
        }
    }

    pub async fn post_comment(
        &self,
        post_id: PostId,
        content: &str,
        parent_comment_id: Option<CommentId>,
    ) -> ApiResult<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::BadRequest("Comment cannot be empty".to_string()));
        }

        self.comments.begin_post();
        match self
            .api
            .post_comment(post_id, content.to_string(), parent_comment_id)
            .await
        {
            Ok(comment) => {
                log_comments!(
                    self.log_config,
                    "post={} created comment {} (parent {:?})",
                    post_id,
                    comment.id,
                    parent_comment_id
                );
                self.comments.finish_post(post_id, comment.clone(), parent_comment_id);
                Ok(comment)
            }
            Err(e) => {
                self.comments.fail_post(e.to_string());
                Err(e)
            }
        }
    }

    /// Send the post's draft, as a reply when one is being composed
    pub async fn submit_composition(&self, post_id: PostId) -> ApiResult<Comment> {
        let composition = self.comments.composition(post_id);
        self.post_comment(post_id, &composition.new_comment, composition.replying_to)
            .await
    }

    pub async fn like_comment(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()> {
        self.comments.begin_like(comment_id);
        match self.api.like_comment(comment_id).await {
            Ok(response) => {
                self.comments.finish_like(post_id, comment_id, &response);
                Ok(())
            }
            Err(e) => {
                self.comments.fail_like(comment_id, e.to_string());
                Err(e)
            }
        }
    }

    /// First page of replies with the configured page size
    pub async fn fetch_replies(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()> {
        self.fetch_replies_page(post_id, comment_id, self.replies_page_size, 0)
            .await
    }

    pub async fn fetch_replies_page(
        &self,
        post_id: PostId,
        comment_id: CommentId,
        limit: usize,
        offset: usize,
    ) -> ApiResult<()> {
        self.comments.begin_replies(comment_id);
        match self.api.fetch_replies(comment_id, limit, offset).await {
            Ok(response) => {
                let (replies, count) = response.into_parts();
                log_comments!(
                    self.log_config,
                    "comment={} fetched {} of {} replies",
                    comment_id,
                    replies.len(),
                    count
                );
                self.comments.finish_replies(post_id, comment_id, replies, count);
                Ok(())
            }
            Err(e) => {
                self.comments.fail_replies(comment_id, e.to_string());
                Err(e)
            }
        }
    }

    pub async fn edit_comment(&self, post_id: PostId, comment_id: CommentId, content: &str) -> ApiResult<Comment> {
        self.comments.begin_edit();
        match self
            .api
            .edit_comment(post_id, comment_id, content.trim().to_string())
            .await
        {
            Ok(edited) => {
                self.comments.finish_edit(post_id, &edited);
                Ok(edited)
            }
            Err(e) => {
                self.comments.fail_edit(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()> {
        self.comments.begin_delete();
        match self.api.delete_comment(post_id, comment_id).await {
            Ok(()) => {
                self.comments.finish_delete(post_id, comment_id);
                Ok(())
            }
            Err(e) => {
                self.comments.fail_delete(e.to_string());
                Err(e)
            }
        }
    }

    /// Load the first page of `tab`, replacing what is shown
    pub async fn load_home_feed(&self, tab: FeedTab) -> ApiResult<()> {
        let limit = self.feed.begin_load(tab);
        log_feed!(self.log_config, "loading {} feed", tab.as_str());

        match self.api.fetch_home_feed(tab, limit, 0).await {
            Ok(response) => {
                let page = response.into_page(0, limit);
                self.initialize_feed_posts(&page.results);
                self.feed.finish_load(tab, page, false);
                Ok(())
            }
            Err(e) => {
                self.feed.fail_load(tab, e.to_string());
                Err(e)
            }
        }
    }

    /// Append the next page. Returns false when there was nothing to load.
    pub async fn load_more_home_feed(&self) -> ApiResult<bool> {
        let Some((tab, offset, limit)) = self.feed.begin_load_more() else {
            return Ok(false);
        };
        log_feed!(self.log_config, "loading {} feed at offset {}", tab.as_str(), offset);

        match self.api.fetch_home_feed(tab, limit, offset).await {
            Ok(response) => {
                let page = response.into_page(offset, limit);
                self.initialize_feed_posts(&page.results);
                self.feed.finish_load(tab, page, true);
                Ok(true)
            }
            Err(e) => {
                self.feed.fail_load(tab, e.to_string());
                Err(e)
            }
        }
    }

    /// Run a search, superseding any search in flight. `None` means the
    /// query was empty or a newer search replaced this one.
    pub async fn search(&self, query: &str, search_type: SearchType) -> ApiResult<Option<SearchResults>> {
        let Some(ticket) = self.search.begin(query, search_type) else {
            return Ok(None);
        };
        log_feed!(self.log_config, "search q={:?} type={}", query, search_type.as_str());

        match self
            .api
            .search(query.trim(), search_type, ticket.cancel_token())
            .await
        {
            Ok(results) => {
                if self.search.finish(&ticket, results.clone()) {
                    Ok(Some(results))
                } else {
                    Ok(None)
                }
            }
            Err(ApiError::Cancelled) => Ok(None),
            Err(e) => {
                self.search.fail(&ticket, e.to_string());
                Err(e)
            }
        }
    }

    /// Live channel consumer wired to this app's stores
    pub fn live_updates(&self) -> LiveUpdates {
        LiveUpdates::new(
            self.interactions.clone(),
            self.comments.clone(),
            self.feed.clone(),
        )
        .with_log_config(self.log_config.clone())
    }
}

/// Turn an error into a message fit for the terminal
pub fn describe_error(error: &ApiError) -> String {
    match error {
        ApiError::Network(e) if e.is_timeout() || e.is_connect() => {
            "Network Error: Connection failed. Check your network and the API URL, then try again".to_string()
        }
        ApiError::Network(e) => format!("Network Error: {}", e),
        ApiError::Unauthorized(_) => {
            "Authorization Error: Session expired. Run `sportisode token set <TOKEN>` to log in again".to_string()
        }
        ApiError::BadRequest(msg) => format!("Validation Error: {}", msg),
        ApiError::NotFound(msg) => format!("Not Found: {}", msg),
        ApiError::Api(msg) if msg.contains("500") || msg.contains("502") || msg.contains("503") => {
            "Server Error: The server is experiencing issues. Please try again later".to_string()
        }
        ApiError::Api(msg) => format!("Error: {}", msg),
        ApiError::Serialization(e) => format!("Error: Unexpected response from server ({})", e),
        ApiError::Cancelled => "Request cancelled".to_string(),
    }
}
