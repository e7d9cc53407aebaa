use serde::{Deserialize, Serialize};

use crate::models::Comment;

/// List bodies as the server sends them. Paginated endpoints answer with
/// `{results, next, count}`, a few older ones with a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paginated {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
        #[serde(default)]
        count: Option<u64>,
    },
    Bare(Vec<T>),
}

impl<T> ListResponse<T> {
    /// Total reported by the server, or the number of items received
    pub fn total(&self) -> u64 {
        match self {
            ListResponse::Paginated { results, count, .. } => {
                count.unwrap_or(results.len() as u64)
            }
            ListResponse::Bare(items) => items.len() as u64,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            ListResponse::Paginated { results, .. } => results,
            ListResponse::Bare(items) => items,
        }
    }

    /// Normalize into the canonical page shape.
    ///
    /// A bare array carries no `next` link, so a full page is taken to mean
    /// there may be more.
    pub fn into_page(self, offset: usize, page_size: usize) -> FeedPage<T> {
        let (results, has_next_page) = match self {
            ListResponse::Paginated { results, next, .. } => (results, next.is_some()),
            ListResponse::Bare(items) => {
                let full = items.len() == page_size;
                (items, full)
            }
        };
        FeedPage {
            results,
            next_offset: offset + page_size,
            has_next_page,
        }
    }
}

/// One page of a limit/offset listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage<T> {
    pub results: Vec<T>,
    pub next_offset: usize,
    pub has_next_page: bool,
}

/// Body of `GET /posts/comments/{id}/replies/`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RepliesResponse {
    Replies {
        replies: Vec<Comment>,
        #[serde(default)]
        count: Option<u64>,
    },
    Paginated {
        results: Vec<Comment>,
        #[serde(default)]
        count: Option<u64>,
    },
    Bare(Vec<Comment>),
}

impl RepliesResponse {
    /// The fetched replies and the total the server reports for them
    pub fn into_parts(self) -> (Vec<Comment>, u64) {
        match self {
            RepliesResponse::Replies { replies, count }
            | RepliesResponse::Paginated {
                results: replies,
                count,
            } => {
                let count = count.unwrap_or(replies.len() as u64);
                (replies, count)
            }
            RepliesResponse::Bare(replies) => {
                let count = replies.len() as u64;
                (replies, count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_paginated_and_bare_bodies_share_page_shape() {
        let paginated: ListResponse<u32> =
            serde_json::from_value(json!({ "results": [1, 2], "next": "http://x/?offset=2", "count": 9 }))
                .unwrap();
        assert_eq!(paginated.total(), 9);
        let page = paginated.into_page(0, 2);
        assert_eq!(page.results, vec![1, 2]);
        assert!(page.has_next_page);
        assert_eq!(page.next_offset, 2);

        let bare: ListResponse<u32> = serde_json::from_value(json!([1, 2])).unwrap();
        let page = bare.into_page(0, 2);
        assert_eq!(page.results, vec![1, 2]);
        assert!(page.has_next_page);
    }

    #[test]
    fn test_short_bare_page_is_last() {
        let bare: ListResponse<u32> = serde_json::from_value(json!([1])).unwrap();
        let page = bare.into_page(10, 10);
        assert!(!page.has_next_page);
        assert_eq!(page.next_offset, 20);
    }

    #[test]
    fn test_last_paginated_page_has_null_next() {
        let body: ListResponse<u32> =
            serde_json::from_value(json!({ "results": [], "next": null })).unwrap();
        assert!(!body.into_page(0, 10).has_next_page);
    }

    #[test]
    fn test_replies_count_falls_back_to_length() {
        let body: RepliesResponse = serde_json::from_value(json!({ "replies": [] })).unwrap();
        let (list, count) = body.into_parts();
        assert!(list.is_empty());
        assert_eq!(count, 0);

        let body: RepliesResponse =
            serde_json::from_value(json!({ "count": 4, "results": [] })).unwrap();
        assert_eq!(body.into_parts().1, 4);
    }
}
