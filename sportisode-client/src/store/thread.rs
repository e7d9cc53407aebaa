use std::collections::{HashMap, HashSet};

use sportisode_types::{Comment, CommentId, CommentReplies};

/// Build a reply tree from a flat comment list.
///
/// Top-level comments keep their input order, as do the replies under each
/// parent. Every node's `replies` is marked loaded with `count` taken from
/// `reply_count`. A comment whose parent is not in the list is dropped,
/// along with anything beneath it; so are cycles.
pub fn group_comments_into_threads(flat: Vec<Comment>) -> Vec<Comment> {
    let mut roots = Vec::new();
    let mut children: HashMap<CommentId, Vec<CommentId>> = HashMap::new();
    let mut by_id: HashMap<CommentId, Comment> = HashMap::with_capacity(flat.len());

    let ids: HashSet<CommentId> = flat.iter().map(|c| c.id).collect();

    for mut comment in flat {
        comment.replies = CommentReplies {
            loaded: true,
            list: Vec::new(),
            count: comment.reply_count,
        };
        match comment.parent_comment_id {
            None => roots.push(comment.id),
            Some(parent) if parent != comment.id && ids.contains(&parent) => {
                children.entry(parent).or_default().push(comment.id);
            }
            Some(parent) => {
                log::debug!("Dropping comment {} with unknown parent {}", comment.id, parent);
            }
        }
        by_id.insert(comment.id, comment);
    }

    roots
        .into_iter()
        .filter_map(|id| build_subtree(id, &mut by_id, &children))
        .collect()
}

// Taking each node out of the map as it is placed bounds the walk
fn build_subtree(
    id: CommentId,
    by_id: &mut HashMap<CommentId, Comment>,
    children: &HashMap<CommentId, Vec<CommentId>>,
) -> Option<Comment> {
    let mut comment = by_id.remove(&id)?;
    if let Some(child_ids) = children.get(&id) {
        comment.replies.list = child_ids
            .iter()
            .filter_map(|child| build_subtree(*child, by_id, children))
            .collect();
    }
    Some(comment)
}

/// Depth-first search through a comment tree
pub(crate) fn find_comment_mut(list: &mut [Comment], id: CommentId) -> Option<&mut Comment> {
    list.iter_mut().find_map(|comment| {
        if comment.id == id {
            Some(comment)
        } else {
            find_comment_mut(&mut comment.replies.list, id)
        }
    })
}

pub(crate) fn contains_comment(list: &[Comment], id: CommentId) -> bool {
    list.iter()
        .any(|comment| comment.id == id || contains_comment(&comment.replies.list, id))
}

/// Append `reply` under `parent_id` and bump the parent's counters by one.
/// Hands the reply back if the parent is not in the tree.
pub(crate) fn attach_reply(list: &mut [Comment], parent_id: CommentId, reply: Comment) -> Result<(), Comment> {
    match find_comment_mut(list, parent_id) {
        Some(parent) => {
            parent.replies.list.push(reply);
            parent.replies.count += 1;
            parent.reply_count += 1;
            Ok(())
        }
        None => Err(reply),
    }
}

/// Remove a comment and its subtree. The direct parent's counters are
/// recomputed from its remaining list.
pub(crate) fn remove_comment(list: &mut Vec<Comment>, id: CommentId) -> bool {
    if let Some(index) = list.iter().position(|comment| comment.id == id) {
        list.remove(index);
        return true;
    }

    for comment in list.iter_mut() {
        if comment.replies.list.iter().any(|reply| reply.id == id) {
            comment.replies.list.retain(|reply| reply.id != id);
            comment.replies.count = comment.replies.list.len() as u64;
            comment.reply_count = comment.replies.count;
            return true;
        }
        if remove_comment(&mut comment.replies.list, id) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sportisode_types::Author;

    fn comment(id: CommentId, parent: Option<CommentId>, reply_count: u64) -> Comment {
        Comment {
            id,
            post: Some(1),
            author: Author {
                id: 1,
                username: "fan".to_string(),
                bio: None,
                profile_picture: None,
                followers_count: 0,
                following_count: 0,
            },
            content: format!("comment {}", id),
            created_at: Utc::now(),
            updated_at: None,
            likes_count: 0,
            is_liked: false,
            reply_count,
            parent_comment_id: parent,
            replies: CommentReplies::default(),
        }
    }

    fn ids(list: &[Comment]) -> Vec<CommentId> {
        list.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_groups_two_levels() {
        let flat = vec![comment(1, None, 1), comment(2, Some(1), 0), comment(3, None, 0)];

        let tree = group_comments_into_threads(flat);

        assert_eq!(ids(&tree), vec![1, 3]);
        assert_eq!(ids(&tree[0].replies.list), vec![2]);
        assert!(tree[0].replies.loaded);
        assert_eq!(tree[0].replies.count, 1);
        assert!(tree[1].replies.list.is_empty());
    }

    #[test]
    fn test_child_before_parent_in_input() {
        let flat = vec![comment(5, Some(4), 0), comment(4, Some(3), 1), comment(3, None, 1)];

        let tree = group_comments_into_threads(flat);

        assert_eq!(ids(&tree), vec![3]);
        assert_eq!(ids(&tree[0].replies.list), vec![4]);
        assert_eq!(ids(&tree[0].replies.list[0].replies.list), vec![5]);
    }

    #[test]
    fn test_orphans_are_dropped() {
        let flat = vec![comment(1, None, 0), comment(2, Some(99), 0), comment(3, Some(2), 0)];

        let tree = group_comments_into_threads(flat);

        assert_eq!(ids(&tree), vec![1]);
        assert!(!contains_comment(&tree, 2));
        assert!(!contains_comment(&tree, 3));
    }

    #[test]
    fn test_cycles_do_not_hang() {
        let flat = vec![comment(1, Some(2), 0), comment(2, Some(1), 0), comment(3, Some(3), 0)];

        assert!(group_comments_into_threads(flat).is_empty());
    }

    #[test]
    fn test_attach_reply_to_nested_parent() {
        let mut tree = group_comments_into_threads(vec![comment(1, None, 1), comment(2, Some(1), 0)]);

        attach_reply(&mut tree, 2, comment(7, Some(2), 0)).unwrap();

        let parent = find_comment_mut(&mut tree, 2).unwrap();
        assert_eq!(ids(&parent.replies.list), vec![7]);
        assert_eq!(parent.reply_count, 1);
        assert_eq!(parent.replies.count, 1);
        // Grandparent counts are untouched
        assert_eq!(tree[0].reply_count, 1);
    }

    #[test]
    fn test_attach_reply_missing_parent() {
        let mut tree = vec![comment(1, None, 0)];
        let reply = attach_reply(&mut tree, 42, comment(7, Some(42), 0)).unwrap_err();
        assert_eq!(reply.id, 7);
    }

    #[test]
    fn test_remove_nested_comment_recomputes_parent() {
        let mut tree = group_comments_into_threads(vec![
            comment(1, None, 2),
            comment(2, Some(1), 1),
            comment(3, Some(1), 0),
            comment(4, Some(2), 0),
        ]);

        assert!(remove_comment(&mut tree, 2));

        assert_eq!(ids(&tree[0].replies.list), vec![3]);
        assert_eq!(tree[0].replies.count, 1);
        assert_eq!(tree[0].reply_count, 1);
        assert!(!contains_comment(&tree, 4));
        assert!(!remove_comment(&mut tree, 2));
    }

    #[test]
    fn test_remove_comment_with_two_nested_replies() {
        let mut tree = group_comments_into_threads(vec![
            comment(1, None, 1),
            comment(2, Some(1), 2),
            comment(5, Some(2), 0),
            comment(6, Some(2), 0),
        ]);
        assert_eq!(ids(&tree[0].replies.list[0].replies.list), vec![5, 6]);

        assert!(remove_comment(&mut tree, 2));

        assert!(tree[0].replies.list.is_empty());
        assert_eq!(tree[0].replies.count, 0);
        assert_eq!(tree[0].reply_count, 0);
        assert!(!contains_comment(&tree, 5));
        assert!(!contains_comment(&tree, 6));
    }

    #[test]
    fn test_remove_top_level_comment() {
        let mut tree = vec![comment(1, None, 0), comment(2, None, 0)];
        assert!(remove_comment(&mut tree, 1));
        assert_eq!(ids(&tree), vec![2]);
    }
}
