use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::{ApiError, ApiResult, SocialApi};
use crate::config::Settings;
use crate::logging::LogConfig;
use crate::storage::StorageAdapter;
use sportisode_types::*;

/// Broadcast to every subscriber when the server rejects the stored token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutSignal {
    /// Endpoint whose response triggered the logout
    pub endpoint: String,
}

/// Request payload. Multipart bodies carry their own content type.
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> ApiResult<Self> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }
}

/// API client for communicating with the Sportisode server.
///
/// Every call goes through [`ApiClient::send`], which reads the token from
/// persistent storage on each request and handles 401 globally.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn StorageAdapter>,
    logout_tx: broadcast::Sender<LogoutSignal>,
    log_config: LogConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn StorageAdapter>) -> Self {
        Self::with_client(Client::new(), base_url, tokens)
    }

    /// Create a client using the timeout and base URL from settings
    pub fn from_settings(settings: &Settings, tokens: Arc<dyn StorageAdapter>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()?;
        Ok(Self::with_client(client, settings.api.base_url.clone(), tokens))
    }

    fn with_client(client: Client, base_url: impl Into<String>, tokens: Arc<dyn StorageAdapter>) -> Self {
        let (logout_tx, _) = broadcast::channel(16);
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            tokens,
            logout_tx,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Receive a [`LogoutSignal`] whenever a request comes back 401
    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutSignal> {
        self.logout_tx.subscribe()
    }

    /// Current auth token, if one is stored. Unreadable storage counts as
    /// logged out.
    pub fn token(&self) -> Option<String> {
        match self.tokens.load_credentials() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Failed to read stored auth token: {}", e);
                None
            }
        }
    }

    /// Helper to add the auth token to a request if available
    fn add_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = self.token() {
            req.header(AUTHORIZATION, format!("Token {}", token))
        } else {
            req
        }
    }

    /// Single entry point for every authenticated call.
    ///
    /// The response is returned as-is (including non-2xx); only a 401 has a
    /// side effect here: the stored token is cleared and a logout is
    /// broadcast.
    pub async fn send(&self, method: Method, endpoint: &str, body: RequestBody) -> ApiResult<reqwest::Response> {
        let url = format!("{}{}", self.base_url, endpoint);
        log_api_call!(self.log_config, "{} {}", method, url);

        let req = self.client.request(method.clone(), &url);
        let req = match body {
            RequestBody::Empty => req.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => req.json(&value),
            RequestBody::Multipart(form) => req.multipart(form),
        };
        let response = self.add_auth_header(req).send().await?;

        log_api_call!(self.log_config, "{} {} -> {}", method, url, response.status());

        if response.status() == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized(endpoint);
        }

        Ok(response)
    }

    fn handle_unauthorized(&self, endpoint: &str) {
        log::warn!("Unauthorized response for {}, clearing stored token", endpoint);
        if let Err(e) = self.tokens.clear_credentials() {
            log::error!("Failed to clear stored token: {}", e);
        }
        // No subscribers is fine; the token is already gone
        let _ = self.logout_tx.send(LogoutSignal {
            endpoint: endpoint.to_string(),
        });
    }

    /// Helper to turn a non-2xx response into an `ApiError`
    async fn error_for(&self, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        // Prefer the server's `{"error": ...}` message, and never surface HTML
        // error pages verbatim
        let clean_error = if let Ok(body) = serde_json::from_str::<ErrorResponse>(&error_text) {
            body.error
        } else if error_text.contains("<html>") || error_text.contains("<!DOCTYPE") {
            format!("Server returned {} error. Please check the server URL.", status.as_u16())
        } else if error_text.is_empty() {
            format!("Server returned {}", status.as_u16())
        } else {
            error_text
        };

        match status.as_u16() {
            404 => ApiError::NotFound(clean_error),
            401 => ApiError::Unauthorized(clean_error),
            400 => ApiError::BadRequest(clean_error),
            _ => ApiError::Api(clean_error),
        }
    }

    /// Helper to handle API responses
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ApiResult<T> {
        if response.status().is_success() {
            let bytes = response.bytes().await?;
            Ok(serde_json::from_slice(&bytes)?)
        } else {
            Err(self.error_for(response).await)
        }
    }

    /// Like `handle_response`, for endpoints whose body is not needed
    async fn handle_empty(&self, response: reqwest::Response) -> ApiResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.error_for(response).await)
        }
    }

    async fn request<T: DeserializeOwned>(&self, method: Method, endpoint: &str, body: RequestBody) -> ApiResult<T> {
        let response = self.send(method, endpoint, body).await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl SocialApi for ApiClient {
    async fn toggle_like(&self, post_id: PostId) -> ApiResult<LikeResponse> {
        let endpoint = format!("/posts/{}/like/", post_id);
        self.request(Method::POST, &endpoint, RequestBody::Empty).await
    }

    async fn create_repost(&self, post_id: PostId, comment: Option<String>) -> ApiResult<RepostResponse> {
        let endpoint = format!("/posts/{}/repost/", post_id);
        let body = RequestBody::json(&RepostRequest {
            comment: comment.unwrap_or_default(),
        })?;
        self.request(Method::POST, &endpoint, body).await
    }

    async fn toggle_bookmark(&self, post_id: PostId) -> ApiResult<BookmarkResponse> {
        let endpoint = format!("/posts/{}/bookmark/", post_id);
        self.request(Method::POST, &endpoint, RequestBody::Empty).await
    }

    async fn log_share(&self, post_id: PostId, platform: &str) -> ApiResult<ShareResponse> {
        let endpoint = format!("/posts/{}/share/", post_id);
        let body = RequestBody::json(&ShareRequest {
            platform: platform.to_string(),
        })?;
        self.request(Method::POST, &endpoint, body).await
    }

    async fn record_view(&self, post_id: PostId, view_type: ViewType) -> ApiResult<()> {
        let endpoint = format!("/posts/{}/view/", post_id);
        let body = RequestBody::json(&ViewRequest {
            view_type: view_type.as_str().to_string(),
            timestamp: Utc::now(),
        })?;
        let response = self.send(Method::POST, &endpoint, body).await?;
        self.handle_empty(response).await
    }

    async fn fetch_comments(&self, post_id: PostId) -> ApiResult<ListResponse<Comment>> {
        let endpoint = format!("/posts/{}/comments/", post_id);
        self.request(Method::GET, &endpoint, RequestBody::Empty).await
    }

    async fn post_comment(
        &self,
        post_id: PostId,
        content: String,
        parent_comment_id: Option<CommentId>,
    ) -> ApiResult<Comment> {
        let endpoint = format!("/posts/{}/comments/", post_id);
        let body = RequestBody::json(&CreateCommentRequest {
            content,
            parent_id: parent_comment_id,
        })?;
        self.request(Method::POST, &endpoint, body).await
    }

    async fn like_comment(&self, comment_id: CommentId) -> ApiResult<CommentLikeResponse> {
        let endpoint = format!("/posts/comments/{}/like/", comment_id);
        self.request(Method::POST, &endpoint, RequestBody::Empty).await
    }

    async fn fetch_replies(&self, comment_id: CommentId, limit: usize, offset: usize) -> ApiResult<RepliesResponse> {
        let endpoint = format!(
            "/posts/comments/{}/replies/?limit={}&offset={}",
            comment_id, limit, offset
        );
        self.request(Method::GET, &endpoint, RequestBody::Empty).await
    }

    async fn edit_comment(&self, post_id: PostId, comment_id: CommentId, content: String) -> ApiResult<Comment> {
        let endpoint = format!("/posts/{}/comments/{}/", post_id, comment_id);
        let body = RequestBody::json(&EditCommentRequest { content })?;
        self.request(Method::PATCH, &endpoint, body).await
    }

    async fn delete_comment(&self, post_id: PostId, comment_id: CommentId) -> ApiResult<()> {
        let endpoint = format!("/posts/{}/comments/{}/", post_id, comment_id);
        let response = self.send(Method::DELETE, &endpoint, RequestBody::Empty).await?;
        self.handle_empty(response).await
    }

    async fn fetch_home_feed(&self, tab: FeedTab, limit: usize, offset: usize) -> ApiResult<ListResponse<FeedPost>> {
        let endpoint = format!(
            "/feed/home/?tab={}&limit={}&offset={}",
            tab.as_str(),
            limit,
            offset
        );
        self.request(Method::GET, &endpoint, RequestBody::Empty).await
    }

    async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        cancel: &CancellationToken,
    ) -> ApiResult<SearchResults> {
        let endpoint = format!(
            "/search/?q={}&type={}",
            urlencoding::encode(query),
            search_type.as_str()
        );
        tokio::select! {
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.request(Method::GET, &endpoint, RequestBody::Empty) => result,
        }
    }
}
