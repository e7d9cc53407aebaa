mod client;
mod error;

pub use client::{ApiClient, LogoutSignal, RequestBody};
pub use error::{ApiError, ApiResult};

use async_trait::async_trait;
use sportisode_types::*;
use tokio_util::sync::CancellationToken;

/// The REST surface the stores are driven through.
///
/// `ApiClient` is the production implementation; the app layer only sees
/// this trait so it can run against any backend.
#[async_trait]
pub trait SocialApi: Send + Sync {
    // Interaction endpoints

    async fn toggle_like(&self, post_id: PostId) -> ApiResult<LikeResponse>;

    async fn create_repost(&self, post_id: PostId, comment: Option<String>) -> ApiResult<RepostResponse>;

    async fn toggle_bookmark(&self, post_id: PostId) -> ApiResult<BookmarkResponse>;

    async fn log_share(&self, post_id: PostId, platform: &str) -> ApiResult<ShareResponse>;

    async fn record_view(&self, post_id: PostId, view_type: ViewType) -> ApiResult<()>;

    // Comment endpoints

    async fn fetch_comments(&self, post_id: PostId) -> ApiResult<ListResponse<Comment>>;

    async fn post_comment(
        &self,
        post_id: PostId,
        content: String,
        parent_comment_id: Option<CommentId>,
    ) -> ApiResult<Comment>;

    async fn like_comment(&self, comment_id: CommentId) -> ApiResult<CommentLikeResponse>;

    async fn fetch_replies(&self, comment_id: CommentId, limit: usize, offset: usize) -> ApiResult<RepliesResponse>;

    async fn edit_comment(&self, post_id: PostId, comment_id: CommentId, content: String) -> ApiResult<Comment>;

    async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()>;

    // Read paths

    async fn fetch_home_feed(&self, tab: FeedTab, limit: usize, offset: usize) -> ApiResult<ListResponse<FeedPost>>;

    /// Resolves to `ApiError::Cancelled` as soon as `cancel` fires
    async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        cancel: &CancellationToken,
    ) -> ApiResult<SearchResults>;
}
