use serde::{Deserialize, Serialize};

/// Interactions that flip a per-user flag on a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleKind {
    Like,
    Repost,
    Bookmark,
}

impl ToggleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToggleKind::Like => "like",
            ToggleKind::Repost => "repost",
            ToggleKind::Bookmark => "bookmark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "like" => Some(ToggleKind::Like),
            "repost" => Some(ToggleKind::Repost),
            "bookmark" => Some(ToggleKind::Bookmark),
            _ => None,
        }
    }
}

/// Every post mutation the client issues. Loading markers and errors are
/// scoped by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Like,
    Repost,
    Bookmark,
    Share,
    View,
}

impl MutationKind {
    pub const ALL: [MutationKind; 5] = [
        MutationKind::Like,
        MutationKind::Repost,
        MutationKind::Bookmark,
        MutationKind::Share,
        MutationKind::View,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Like => "like",
            MutationKind::Repost => "repost",
            MutationKind::Bookmark => "bookmark",
            MutationKind::Share => "share",
            MutationKind::View => "view",
        }
    }
}

impl From<ToggleKind> for MutationKind {
    fn from(kind: ToggleKind) -> Self {
        match kind {
            ToggleKind::Like => MutationKind::Like,
            ToggleKind::Repost => MutationKind::Repost,
            ToggleKind::Bookmark => MutationKind::Bookmark,
        }
    }
}

/// Comment store operations, used to scope errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOp {
    FetchComments,
    PostComment,
    LikeComment,
    FetchReplies,
    EditComment,
    DeleteComment,
}

impl CommentOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentOp::FetchComments => "fetch_comments",
            CommentOp::PostComment => "post_comment",
            CommentOp::LikeComment => "like_comment",
            CommentOp::FetchReplies => "fetch_replies",
            CommentOp::EditComment => "edit_comment",
            CommentOp::DeleteComment => "delete_comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeedTab {
    #[default]
    ForYou,
    Following,
}

impl FeedTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedTab::ForYou => "for_you",
            FeedTab::Following => "following",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "for_you" | "foryou" => Some(FeedTab::ForYou),
            "following" => Some(FeedTab::Following),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Feed,
    Detail,
    Impression,
}

impl ViewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewType::Feed => "feed",
            ViewType::Detail => "detail",
            ViewType::Impression => "impression",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    All,
    Users,
    Posts,
    Leagues,
    Teams,
    Athletes,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::All => "all",
            SearchType::Users => "users",
            SearchType::Posts => "posts",
            SearchType::Leagues => "leagues",
            SearchType::Teams => "teams",
            SearchType::Athletes => "athletes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(SearchType::All),
            "users" => Some(SearchType::Users),
            "posts" => Some(SearchType::Posts),
            "leagues" => Some(SearchType::Leagues),
            "teams" => Some(SearchType::Teams),
            "athletes" => Some(SearchType::Athletes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_tab_round_trips_through_query_value() {
        assert_eq!(FeedTab::parse(FeedTab::ForYou.as_str()), Some(FeedTab::ForYou));
        assert_eq!(FeedTab::parse("Following"), Some(FeedTab::Following));
        assert_eq!(FeedTab::parse("for-you"), Some(FeedTab::ForYou));
        assert_eq!(FeedTab::parse("trending"), None);
    }

    #[test]
    fn test_toggle_kind_maps_to_mutation_kind() {
        assert_eq!(MutationKind::from(ToggleKind::Like), MutationKind::Like);
        assert_eq!(MutationKind::from(ToggleKind::Repost), MutationKind::Repost);
        assert_eq!(MutationKind::from(ToggleKind::Bookmark), MutationKind::Bookmark);
    }

    #[test]
    fn test_search_type_parse_is_case_insensitive() {
        assert_eq!(SearchType::parse("TEAMS"), Some(SearchType::Teams));
        assert_eq!(SearchType::parse("nope"), None);
    }
}
