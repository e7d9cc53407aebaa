use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use sportisode_types::*;

use super::lock;
use super::thread::{attach_reply, contains_comment, find_comment_mut, remove_comment};

/// Cached comments for one post
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostComments {
    /// Top-level comments, newest first once the user starts posting
    pub list: Vec<Comment>,
    /// Total top-level comments on the server
    pub count: u64,
    pub loading: bool,
    pub error: Option<String>,
}

/// Draft state of a post's comment box
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentComposition {
    pub new_comment: String,
    pub replying_to: Option<CommentId>,
}

#[derive(Debug, Default)]
struct CommentState {
    posts: HashMap<PostId, PostComments>,
    compositions: HashMap<PostId, CommentComposition>,
    collapsed: HashSet<CommentId>,
    posting: bool,
    liking: HashSet<CommentId>,
    fetching_replies: HashSet<CommentId>,
    editing: bool,
    deleting: bool,
    errors: HashMap<CommentOp, String>,
}

/// Comment threads keyed by post, plus composition and collapse state.
///
/// Comment lookups are always scoped to a post, so two posts never see each
/// other's comments even if ids collide.
#[derive(Debug, Default)]
pub struct CommentStore {
    state: Mutex<CommentState>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comments(&self, post_id: PostId) -> Option<PostComments> {
        lock(&self.state).posts.get(&post_id).cloned()
    }

    pub fn find_comment(&self, post_id: PostId, comment_id: CommentId) -> Option<Comment> {
        let mut state = lock(&self.state);
        let post = state.posts.get_mut(&post_id)?;
        find_comment_mut(&mut post.list, comment_id).cloned()
    }

    pub fn error(&self, op: CommentOp) -> Option<String> {
        lock(&self.state).errors.get(&op).cloned()
    }

    pub fn clear_error(&self, op: CommentOp) {
        lock(&self.state).errors.remove(&op);
    }

    // Fetching a post's comments

    pub fn begin_fetch(&self, post_id: PostId) {
        let mut state = lock(&self.state);
        state.errors.remove(&CommentOp::FetchComments);
        let post = state.posts.entry(post_id).or_default();
        post.loading = true;
        post.error = None;
    }

    /// Replace the post's list. Replies start unfetched, sized by each
    /// comment's `reply_count`.
    pub fn finish_fetch(&self, post_id: PostId, response: ListResponse<Comment>) {
        let count = response.total();
        let list: Vec<Comment> = response
            .into_items()
            .into_iter()
            .map(Comment::with_unfetched_replies)
            .collect();

        let mut state = lock(&self.state);
        let post = state.posts.entry(post_id).or_default();
        post.list = list;
        post.count = count;
        post.loading = false;
        post.error = None;
    }

    pub fn fail_fetch(&self, post_id: PostId, error: impl Into<String>) {
        let error = error.into();
        let mut state = lock(&self.state);
        let post = state.posts.entry(post_id).or_default();
        post.loading = false;
        post.error = Some(error.clone());
        state.errors.insert(CommentOp::FetchComments, error);
    }

    pub fn is_fetching(&self, post_id: PostId) -> bool {
        lock(&self.state).posts.get(&post_id).is_some_and(|post| post.loading)
    }

    // Posting

    pub fn begin_post(&self) {
        let mut state = lock(&self.state);
        state.posting = true;
        state.errors.remove(&CommentOp::PostComment);
    }

    /// Place a freshly created comment. A reply goes at the end of its
    /// parent's list; a top-level comment goes first. The draft is cleared.
    pub fn finish_post(&self, post_id: PostId, comment: Comment, parent_comment_id: Option<CommentId>) {
        let comment = comment.with_unfetched_replies();
        let mut state = lock(&self.state);
        state.posting = false;

        match parent_comment_id {
            Some(parent_id) => {
                let placed = state
                    .posts
                    .get_mut(&post_id)
                    .map(|post| attach_reply(&mut post.list, parent_id, comment).is_ok())
                    .unwrap_or(false);
                if !placed {
                    log::warn!(
                        "Reply to comment {} on post {} has no loaded parent",
                        parent_id,
                        post_id
                    );
                }
            }
            None => {
                let post = state.posts.entry(post_id).or_default();
                post.list.insert(0, comment);
                post.count += 1;
            }
        }

        if let Some(composition) = state.compositions.get_mut(&post_id) {
            *composition = CommentComposition::default();
        }
    }

    /// Keeps the draft so the user can retry
    pub fn fail_post(&self, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.posting = false;
        state.errors.insert(CommentOp::PostComment, error.into());
    }

    pub fn is_posting(&self) -> bool {
        lock(&self.state).posting
    }

    // Liking

    pub fn begin_like(&self, comment_id: CommentId) {
        let mut state = lock(&self.state);
        state.liking.insert(comment_id);
        state.errors.remove(&CommentOp::LikeComment);
    }

    /// Fields missing from the response leave the stored values as they are
    pub fn finish_like(&self, post_id: PostId, comment_id: CommentId, response: &CommentLikeResponse) -> bool {
        let mut state = lock(&self.state);
        state.liking.remove(&comment_id);

        let Some(post) = state.posts.get_mut(&post_id) else {
            return false;
        };
        let Some(comment) = find_comment_mut(&mut post.list, comment_id) else {
            return false;
        };
        if let Some(likes_count) = response.likes_count {
            comment.likes_count = likes_count;
        }
        if let Some(is_liked) = response.is_liked {
            comment.is_liked = is_liked;
        }
        true
    }

    pub fn fail_like(&self, comment_id: CommentId, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.liking.remove(&comment_id);
        state.errors.insert(CommentOp::LikeComment, error.into());
    }

    pub fn is_liking(&self, comment_id: CommentId) -> bool {
        lock(&self.state).liking.contains(&comment_id)
    }

    // Replies

    pub fn begin_replies(&self, comment_id: CommentId) {
        let mut state = lock(&self.state);
        state.fetching_replies.insert(comment_id);
        state.errors.remove(&CommentOp::FetchReplies);
    }

    /// Replace whatever replies were loaded before
    pub fn finish_replies(&self, post_id: PostId, comment_id: CommentId, replies: Vec<Comment>, count: u64) -> bool {
        let list = replies.into_iter().map(Comment::with_unfetched_replies).collect();

        let mut state = lock(&self.state);
        state.fetching_replies.remove(&comment_id);

        let Some(post) = state.posts.get_mut(&post_id) else {
            return false;
        };
        match find_comment_mut(&mut post.list, comment_id) {
            Some(comment) => {
                comment.replies = CommentReplies {
                    loaded: true,
                    list,
                    count,
                };
                true
            }
            None => false,
        }
    }

    pub fn fail_replies(&self, comment_id: CommentId, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.fetching_replies.remove(&comment_id);
        state.errors.insert(CommentOp::FetchReplies, error.into());
    }

    pub fn is_fetching_replies(&self, comment_id: CommentId) -> bool {
        lock(&self.state).fetching_replies.contains(&comment_id)
    }

    // Editing

    pub fn begin_edit(&self) {
        let mut state = lock(&self.state);
        state.editing = true;
        state.errors.remove(&CommentOp::EditComment);
    }

    /// Merge the server's copy into the stored comment, keeping its replies
    pub fn finish_edit(&self, post_id: PostId, edited: &Comment) -> bool {
        let mut state = lock(&self.state);
        state.editing = false;

        let Some(post) = state.posts.get_mut(&post_id) else {
            return false;
        };
        match find_comment_mut(&mut post.list, edited.id) {
            Some(comment) => {
                comment.merge_edit(edited);
                true
            }
            None => false,
        }
    }

    pub fn fail_edit(&self, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.editing = false;
        state.errors.insert(CommentOp::EditComment, error.into());
    }

    pub fn is_editing(&self) -> bool {
        lock(&self.state).editing
    }

    // Deleting

    pub fn begin_delete(&self) {
        let mut state = lock(&self.state);
        state.deleting = true;
        state.errors.remove(&CommentOp::DeleteComment);
    }

    /// Drop the comment and its subtree; the post count follows the
    /// top-level list
    pub fn finish_delete(&self, post_id: PostId, comment_id: CommentId) -> bool {
        let mut state = lock(&self.state);
        state.deleting = false;
        state.collapsed.remove(&comment_id);

        let Some(post) = state.posts.get_mut(&post_id) else {
            return false;
        };
        let removed = remove_comment(&mut post.list, comment_id);
        post.count = post.list.len() as u64;
        removed
    }

    pub fn fail_delete(&self, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.deleting = false;
        state.errors.insert(CommentOp::DeleteComment, error.into());
    }

    pub fn is_deleting(&self) -> bool {
        lock(&self.state).deleting
    }

    // Thread UI

    /// Returns whether the thread is collapsed after the toggle
    pub fn toggle_thread_collapse(&self, comment_id: CommentId) -> bool {
        let mut state = lock(&self.state);
        if state.collapsed.remove(&comment_id) {
            false
        } else {
            state.collapsed.insert(comment_id);
            true
        }
    }

    pub fn is_collapsed(&self, comment_id: CommentId) -> bool {
        lock(&self.state).collapsed.contains(&comment_id)
    }

    // Composition

    pub fn composition(&self, post_id: PostId) -> CommentComposition {
        lock(&self.state)
            .compositions
            .get(&post_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_new_comment(&self, post_id: PostId, text: impl Into<String>) {
        lock(&self.state).compositions.entry(post_id).or_default().new_comment = text.into();
    }

    pub fn set_replying_to(&self, post_id: PostId, comment_id: Option<CommentId>) {
        lock(&self.state).compositions.entry(post_id).or_default().replying_to = comment_id;
    }

    /// Cancel the reply being composed, draft text included
    pub fn clear_reply(&self, post_id: PostId) {
        if let Some(composition) = lock(&self.state).compositions.get_mut(&post_id) {
            composition.replying_to = None;
            composition.new_comment.clear();
        }
    }

    pub fn reset_composition(&self, post_id: PostId) {
        if let Some(composition) = lock(&self.state).compositions.get_mut(&post_id) {
            *composition = CommentComposition::default();
        }
    }

    /// Forget everything cached for the post
    pub fn reset_post_comments(&self, post_id: PostId) {
        let mut state = lock(&self.state);
        state.posts.remove(&post_id);
        state.compositions.remove(&post_id);
    }

    /// Place a comment pushed over the live channel. Returns false when the
    /// post is not loaded or the comment is already present.
    ///
    /// A reply whose parent has not fetched its replies only bumps the
    /// parent's counters.
    pub fn apply_live_comment(&self, post_id: PostId, comment: Comment) -> bool {
        let mut state = lock(&self.state);
        let Some(post) = state.posts.get_mut(&post_id) else {
            return false;
        };
        if contains_comment(&post.list, comment.id) {
            return false;
        }

        let comment = comment.with_unfetched_replies();
        match comment.parent_comment_id {
            None => {
                post.list.insert(0, comment);
                post.count += 1;
                true
            }
            Some(parent_id) => {
                let Some(parent) = find_comment_mut(&mut post.list, parent_id) else {
                    return false;
                };
                if parent.replies.loaded {
                    parent.replies.list.push(comment);
                }
                parent.replies.count += 1;
                parent.reply_count += 1;
                true
            }
        }
    }
}
