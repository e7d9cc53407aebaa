use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Comment, PostId};

/// Server push on a post's live channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LiveEvent {
    /// Another user liked or unliked the post
    LikesUpdate { post_id: PostId, likes_count: u64 },
    /// A comment was created on the post
    NewComment { post_id: PostId, comment: Comment },
}

impl LiveEvent {
    pub fn post_id(&self) -> PostId {
        match self {
            LiveEvent::LikesUpdate { post_id, .. } | LiveEvent::NewComment { post_id, .. } => {
                *post_id
            }
        }
    }

    /// Decode one text frame.
    ///
    /// Frames arrive either bare (`{"event_type": ...}`) or wrapped by the
    /// channel layer (`{"type": ..., "data": {"event_type": ...}}`). Frames
    /// without a recognised `event_type` (pongs, chat, future events) decode
    /// to `Ok(None)`; only malformed JSON or a known event with a bad payload
    /// is an error.
    pub fn parse_frame(text: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let payload = match value.get("data") {
            Some(data) if data.is_object() => data.clone(),
            _ => value,
        };

        match payload.get("event_type").and_then(Value::as_str) {
            Some("likes_update") | Some("new_comment") => {
                serde_json::from_value(payload).map(Some)
            }
            _ => Ok(None),
        }
    }
}
