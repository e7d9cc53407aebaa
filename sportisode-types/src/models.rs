use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side post identifier
pub type PostId = i64;
/// Server-side comment identifier. Not scoped by post on the server.
pub type CommentId = i64;

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{self, Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match date {
                Some(d) => serializer.serialize_some(&d.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = Option::<String>::deserialize(deserializer)?;
            s.map(|s| s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Public profile fields embedded in posts and comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// Reply descriptor attached to every comment held by the client.
///
/// `loaded == false` with a non-zero `count` means the children exist on the
/// server but have not been fetched; an empty `list` says nothing about
/// whether replies exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentReplies {
    pub loaded: bool,
    pub list: Vec<Comment>,
    pub count: u64,
}

impl CommentReplies {
    /// Descriptor for a comment whose children have not been fetched yet
    pub fn unfetched(count: u64) -> Self {
        Self {
            loaded: false,
            list: Vec::new(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CommentWire")]
pub struct Comment {
    pub id: CommentId,
    #[serde(default)]
    pub post: Option<PostId>,
    pub author: Author,
    pub content: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "datetime_format::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub reply_count: u64,
    /// Parent comment for replies (None for top-level comments)
    #[serde(rename = "parent_comment")]
    pub parent_comment_id: Option<CommentId>,
    #[serde(default)]
    pub replies: CommentReplies,
}

/// Comment as it arrives. The REST serializer names the parent
/// `parent_comment`, socket pushes use `parentId`; payloads may carry more
/// than one of them.
#[derive(Deserialize)]
struct CommentWire {
    id: CommentId,
    #[serde(default)]
    post: Option<PostId>,
    author: Author,
    content: String,
    #[serde(with = "datetime_format")]
    created_at: DateTime<Utc>,
    #[serde(default, with = "datetime_format::option")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    likes_count: u64,
    #[serde(default)]
    is_liked: bool,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    parent_comment: Option<CommentId>,
    #[serde(default)]
    parent_comment_id: Option<CommentId>,
    #[serde(default, rename = "parentId")]
    parent_id: Option<CommentId>,
    #[serde(default)]
    replies: CommentReplies,
}

impl From<CommentWire> for Comment {
    fn from(wire: CommentWire) -> Self {
        Comment {
            id: wire.id,
            post: wire.post,
            author: wire.author,
            content: wire.content,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
            likes_count: wire.likes_count,
            is_liked: wire.is_liked,
            reply_count: wire.reply_count,
            parent_comment_id: wire
                .parent_comment
                .or(wire.parent_comment_id)
                .or(wire.parent_id),
            replies: wire.replies,
        }
    }
}

impl Comment {
    /// Reset the reply descriptor to the unfetched state, sized by `reply_count`
    pub fn with_unfetched_replies(mut self) -> Self {
        self.replies = CommentReplies::unfetched(self.reply_count);
        self
    }

    /// Take every field of the server copy except the locally loaded
    /// replies. Ids the response leaves out are kept.
    pub fn merge_edit(&mut self, edited: &Comment) {
        let replies = std::mem::take(&mut self.replies);
        let post = edited.post.or(self.post);
        let parent_comment_id = edited.parent_comment_id.or(self.parent_comment_id);
        *self = Comment {
            post,
            parent_comment_id,
            replies,
            ..edited.clone()
        };
    }
}

/// Values a post card carries when it first renders
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_reposted: bool,
    #[serde(default)]
    pub reposts_count: u64,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub views_count: u64,
}

/// Client-side interaction state for one post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInteraction {
    pub is_liked: bool,
    pub likes_count: u64,
    pub is_reposted: bool,
    pub reposts_count: u64,
    pub is_bookmarked: bool,
    pub views_count: u64,
    pub share_count: u64,
}

impl From<InteractionSnapshot> for PostInteraction {
    fn from(snapshot: InteractionSnapshot) -> Self {
        Self {
            is_liked: snapshot.is_liked,
            likes_count: snapshot.likes_count,
            is_reposted: snapshot.is_reposted,
            reposts_count: snapshot.reposts_count,
            is_bookmarked: snapshot.is_bookmarked,
            views_count: snapshot.views_count,
            share_count: 0,
        }
    }
}

/// Partial update pushed by the server; absent fields are left alone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub likes_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_reposted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reposts_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_count: Option<u64>,
}

impl PostInteraction {
    pub fn apply_patch(&mut self, patch: &InteractionPatch) {
        if let Some(v) = patch.is_liked {
            self.is_liked = v;
        }
        if let Some(v) = patch.likes_count {
            self.likes_count = v;
        }
        if let Some(v) = patch.is_reposted {
            self.is_reposted = v;
        }
        if let Some(v) = patch.reposts_count {
            self.reposts_count = v;
        }
        if let Some(v) = patch.is_bookmarked {
            self.is_bookmarked = v;
        }
        if let Some(v) = patch.views_count {
            self.views_count = v;
        }
        if let Some(v) = patch.share_count {
            self.share_count = v;
        }
    }
}

/// A post as delivered by the feed endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    /// Reposts are addressed as `r_<id>` by some endpoints, so ids are kept as
    /// raw JSON values and parsed on demand
    pub id: serde_json::Value,
    pub author: Author,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, with = "datetime_format::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub comments_count: u64,
    #[serde(default)]
    pub reposts_count: u64,
    #[serde(default)]
    pub views_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_reposted: bool,
    #[serde(default)]
    pub is_bookmarked: bool,
    /// Fields this client does not interpret (media, league tags, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FeedPost {
    /// Numeric post id, if this post is addressable by the interaction
    /// endpoints
    pub fn post_id(&self) -> Option<PostId> {
        match &self.id {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn interaction_snapshot(&self) -> InteractionSnapshot {
        InteractionSnapshot {
            is_liked: self.is_liked,
            likes_count: self.likes_count,
            is_reposted: self.is_reposted,
            reposts_count: self.reposts_count,
            is_bookmarked: self.is_bookmarked,
            views_count: self.views_count,
        }
    }
}

// Request/Response types for API

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    #[serde(rename = "isLiked", alias = "is_liked")]
    pub is_liked: bool,
    pub likes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepostResponse {
    #[serde(rename = "repostCount", alias = "reposts_count")]
    pub repost_count: u64,
    #[serde(rename = "newPostId", default)]
    pub new_post_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkResponse {
    #[serde(rename = "isBookmarked", alias = "is_bookmarked")]
    pub is_bookmarked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResponse {
    #[serde(rename = "shareCount", alias = "shares_count")]
    pub share_count: u64,
    #[serde(rename = "shortUrl", default)]
    pub short_url: Option<String>,
}

/// Comment like endpoint reply. Older servers answer `{"status": "liked"}`
/// only, so both fields are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentLikeResponse {
    #[serde(default)]
    pub likes_count: Option<u64>,
    #[serde(default, alias = "isLiked")]
    pub is_liked: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepostRequest {
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareRequest {
    pub platform: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewRequest {
    pub view_type: String,
    #[serde(with = "datetime_format")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(rename = "parentId", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Search endpoint body: a total plus results keyed by entity type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub results: serde_json::Map<String, serde_json::Value>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.results.is_empty()
    }
}
