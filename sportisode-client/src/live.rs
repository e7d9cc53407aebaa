//! Consumer side of the per-post live channel.
//!
//! The socket itself belongs to whoever embeds the client; it forwards each
//! text frame into an `mpsc` channel and [`LiveUpdates::spawn`] applies them
//! to the stores until cancelled.

use std::sync::Arc;

use sportisode_types::{InteractionPatch, LiveEvent, PostId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::logging::LogConfig;
use crate::store::{CommentStore, FeedStore, InteractionStore};

/// Channel path for a post, relative to the socket base URL
pub fn channel_path(post_id: PostId) -> String {
    format!("/post/{}/", post_id)
}

/// Full socket URL for a post. The token rides in the query string since
/// browsers cannot set headers on a socket handshake.
pub fn channel_url(ws_base: &str, post_id: PostId, token: Option<&str>) -> String {
    let url = format!("{}{}", ws_base.trim_end_matches('/'), channel_path(post_id));
    match token {
        Some(token) => format!("{}?token={}", url, urlencoding::encode(token)),
        None => url,
    }
}

/// Routes live events into the stores
#[derive(Debug, Clone)]
pub struct LiveUpdates {
    interactions: Arc<InteractionStore>,
    comments: Arc<CommentStore>,
    feed: Arc<FeedStore>,
    log_config: LogConfig,
}

impl LiveUpdates {
    pub fn new(interactions: Arc<InteractionStore>, comments: Arc<CommentStore>, feed: Arc<FeedStore>) -> Self {
        Self {
            interactions,
            comments,
            feed,
            log_config: LogConfig::default(),
        }
    }

    pub fn with_log_config(mut self, log_config: LogConfig) -> Self {
        self.log_config = log_config;
        self
    }

    /// Returns whether any store changed
    pub fn apply_event(&self, event: LiveEvent) -> bool {
        match event {
            LiveEvent::LikesUpdate { post_id, likes_count } => {
                log_live!(self.log_config, "likes_update post={} likes={}", post_id, likes_count);
                let tracked = self.interactions.apply_live_likes(post_id, likes_count);
                let in_feed = self.feed.update_post_in_feed(
                    post_id,
                    &InteractionPatch {
                        likes_count: Some(likes_count),
                        ..Default::default()
                    },
                );
                tracked || in_feed
            }
            LiveEvent::NewComment { post_id, comment } => {
                log_live!(self.log_config, "new_comment post={} comment={}", post_id, comment.id);
                self.comments.apply_live_comment(post_id, comment)
            }
        }
    }

    /// Decode and apply one text frame. Unknown events and malformed frames
    /// are logged and dropped.
    pub fn apply_frame(&self, text: &str) -> bool {
        match LiveEvent::parse_frame(text) {
            Ok(Some(event)) => self.apply_event(event),
            Ok(None) => {
                log_live!(self.log_config, "Ignoring frame without a known event: {}", text);
                false
            }
            Err(e) => {
                log::warn!("Malformed live frame: {}", e);
                false
            }
        }
    }

    /// Consume frames for `post_id`'s channel until the sender goes away or
    /// `cancel` fires. Events for other posts are dropped.
    pub fn spawn(self, post_id: PostId, mut frames: mpsc::Receiver<String>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!("Live channel {} started", channel_path(post_id));
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        log::info!("Live channel {} cancelled", channel_path(post_id));
                        break;
                    }
                    frame = frames.recv() => {
                        let Some(text) = frame else {
                            log::info!("Live channel {} closed", channel_path(post_id));
                            break;
                        };
                        match LiveEvent::parse_frame(&text) {
                            Ok(Some(event)) if event.post_id() != post_id => {
                                log_live!(self.log_config, "Dropping event for post {} on channel {}", event.post_id(), post_id);
                            }
                            Ok(Some(event)) => {
                                self.apply_event(event);
                            }
                            Ok(None) => {
                                log_live!(self.log_config, "Ignoring frame without a known event");
                            }
                            Err(e) => log::warn!("Malformed live frame: {}", e),
                        }
                    }
                }
            }
        })
    }
}
