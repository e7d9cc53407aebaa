use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sportisode_types::*;

use super::lock;

/// How long the "link copied" marker stays up after a share
const SHARE_COPIED_FOR: Duration = Duration::from_secs(2);

/// Record of one optimistic flip, handed back by
/// [`InteractionStore::optimistic_toggle`].
///
/// Exactly one of `confirm_toggle` or `revert_toggle` must consume it.
#[must_use = "an optimistic toggle must be confirmed or reverted"]
#[derive(Debug, PartialEq, Eq)]
pub struct ToggleAttempt {
    kind: ToggleKind,
    post_id: PostId,
    previous: bool,
    likes_delta: i64,
    tracked: bool,
}

impl ToggleAttempt {
    pub fn kind(&self) -> ToggleKind {
        self.kind
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    /// Flag value before the flip
    pub fn previous(&self) -> bool {
        self.previous
    }

    /// False when the post had no record, so nothing was flipped
    pub fn tracked(&self) -> bool {
        self.tracked
    }
}

/// Server answer to a toggle, one variant per kind
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Like(LikeResponse),
    Repost(RepostResponse),
    Bookmark(BookmarkResponse),
}

#[derive(Debug, Default)]
struct InteractionState {
    interactions: HashMap<PostId, PostInteraction>,
    pending: HashMap<MutationKind, HashSet<PostId>>,
    errors: HashMap<MutationKind, String>,
    last_views: HashMap<PostId, Instant>,
    share_copied: HashMap<PostId, Instant>,
}

impl InteractionState {
    fn set_pending(&mut self, kind: MutationKind, post_id: PostId) {
        self.pending.entry(kind).or_default().insert(post_id);
    }

    fn clear_pending(&mut self, kind: MutationKind, post_id: PostId) {
        if let Some(ids) = self.pending.get_mut(&kind) {
            ids.remove(&post_id);
        }
    }
}

/// Per-post like/repost/bookmark/share/view state
#[derive(Debug)]
pub struct InteractionStore {
    state: Mutex<InteractionState>,
    view_cooldown: Duration,
}

impl Default for InteractionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl InteractionStore {
    pub fn new(view_cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(InteractionState::default()),
            view_cooldown,
        }
    }

    /// Seed a post's record from what the card rendered with. Existing
    /// records are left alone.
    pub fn initialize(&self, post_id: PostId, snapshot: InteractionSnapshot) {
        lock(&self.state)
            .interactions
            .entry(post_id)
            .or_insert_with(|| snapshot.into());
    }

    /// Current record, or the all-zero default for an untracked post
    pub fn get(&self, post_id: PostId) -> PostInteraction {
        lock(&self.state)
            .interactions
            .get(&post_id)
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, post_id: PostId) -> bool {
        lock(&self.state).interactions.contains_key(&post_id)
    }

    /// Flip the flag for `kind` ahead of the request. A like also moves
    /// `likes_count` by one in the same direction.
    pub fn optimistic_toggle(&self, kind: ToggleKind, post_id: PostId) -> ToggleAttempt {
        let mut state = lock(&self.state);
        let mutation = MutationKind::from(kind);
        state.set_pending(mutation, post_id);
        state.errors.remove(&mutation);

        let Some(record) = state.interactions.get_mut(&post_id) else {
            return ToggleAttempt {
                kind,
                post_id,
                previous: false,
                likes_delta: 0,
                tracked: false,
            };
        };

        let (previous, likes_delta) = match kind {
            ToggleKind::Like => {
                let previous = record.is_liked;
                record.is_liked = !previous;
                let before = record.likes_count;
                record.likes_count = if record.is_liked {
                    before + 1
                } else {
                    before.saturating_sub(1)
                };
                (previous, record.likes_count as i64 - before as i64)
            }
            ToggleKind::Repost => {
                let previous = record.is_reposted;
                record.is_reposted = !previous;
                (previous, 0)
            }
            ToggleKind::Bookmark => {
                let previous = record.is_bookmarked;
                record.is_bookmarked = !previous;
                (previous, 0)
            }
        };

        ToggleAttempt {
            kind,
            post_id,
            previous,
            likes_delta,
            tracked: true,
        }
    }

    /// Overwrite local state with the server's answer. Server counts win over
    /// any local estimate; a missing record is created.
    pub fn confirm_toggle(&self, attempt: ToggleAttempt, outcome: &ToggleOutcome) {
        let mut state = lock(&self.state);
        state.clear_pending(attempt.kind.into(), attempt.post_id);

        let record = state.interactions.entry(attempt.post_id).or_default();
        match outcome {
            ToggleOutcome::Like(response) => {
                record.is_liked = response.is_liked;
                record.likes_count = response.likes_count;
            }
            ToggleOutcome::Repost(response) => {
                record.is_reposted = true;
                record.reposts_count = response.repost_count;
            }
            ToggleOutcome::Bookmark(response) => {
                record.is_bookmarked = response.is_bookmarked;
            }
        }

        // The new repost mirrors the original's aggregate if it is on screen
        if let ToggleOutcome::Repost(response) = outcome {
            if let Some(repost_id) = response.new_post_id.as_deref().and_then(parse_repost_id) {
                if let Some(repost) = state.interactions.get_mut(&repost_id) {
                    repost.is_reposted = true;
                    repost.reposts_count = response.repost_count;
                }
            }
        }
    }

    /// Undo what `attempt` applied: flip the flag back and take back the
    /// count change. Overlapping attempts on one post may be reverted in
    /// any order as long as the count never has to go below zero.
    pub fn revert_toggle(&self, attempt: ToggleAttempt) {
        let mut state = lock(&self.state);
        state.clear_pending(attempt.kind.into(), attempt.post_id);

        if !attempt.tracked {
            return;
        }
        let Some(record) = state.interactions.get_mut(&attempt.post_id) else {
            return;
        };

        match attempt.kind {
            ToggleKind::Like => {
                record.is_liked = !record.is_liked;
                let reverted = record.likes_count as i64 - attempt.likes_delta;
                record.likes_count = reverted.max(0) as u64;
            }
            ToggleKind::Repost => record.is_reposted = !record.is_reposted,
            ToggleKind::Bookmark => record.is_bookmarked = !record.is_bookmarked,
        }
    }

    /// Mark a non-toggle mutation (share, view) as in flight and clear the
    /// kind's last error
    pub fn begin_mutation(&self, kind: MutationKind, post_id: PostId) {
        let mut state = lock(&self.state);
        state.set_pending(kind, post_id);
        state.errors.remove(&kind);
    }

    /// Clear the in-flight marker and keep the message for the UI
    pub fn fail_mutation(&self, kind: MutationKind, post_id: PostId, error: impl Into<String>) {
        let mut state = lock(&self.state);
        state.clear_pending(kind, post_id);
        state.errors.insert(kind, error.into());
    }

    pub fn record_error(&self, kind: MutationKind, error: impl Into<String>) {
        lock(&self.state).errors.insert(kind, error.into());
    }

    pub fn error(&self, kind: MutationKind) -> Option<String> {
        lock(&self.state).errors.get(&kind).cloned()
    }

    pub fn clear_error(&self, kind: MutationKind) {
        lock(&self.state).errors.remove(&kind);
    }

    pub fn is_pending(&self, kind: MutationKind, post_id: PostId) -> bool {
        lock(&self.state)
            .pending
            .get(&kind)
            .is_some_and(|ids| ids.contains(&post_id))
    }

    pub fn confirm_share(&self, post_id: PostId, response: &ShareResponse) {
        let mut state = lock(&self.state);
        state.clear_pending(MutationKind::Share, post_id);
        state.interactions.entry(post_id).or_default().share_count = response.share_count;
    }

    pub fn mark_share_copied(&self, post_id: PostId) {
        self.mark_share_copied_at(post_id, Instant::now());
    }

    pub fn mark_share_copied_at(&self, post_id: PostId, now: Instant) {
        lock(&self.state).share_copied.insert(post_id, now);
    }

    pub fn is_share_copied(&self, post_id: PostId) -> bool {
        self.is_share_copied_at(post_id, Instant::now())
    }

    pub fn is_share_copied_at(&self, post_id: PostId, now: Instant) -> bool {
        lock(&self.state)
            .share_copied
            .get(&post_id)
            .is_some_and(|at| now.saturating_duration_since(*at) < SHARE_COPIED_FOR)
    }

    pub fn should_record_view(&self, post_id: PostId) -> bool {
        self.should_record_view_at(post_id, Instant::now())
    }

    /// False while a view request for the post is in flight or its last
    /// recorded view is inside the cooldown
    pub fn should_record_view_at(&self, post_id: PostId, now: Instant) -> bool {
        let state = lock(&self.state);
        let pending = state
            .pending
            .get(&MutationKind::View)
            .is_some_and(|ids| ids.contains(&post_id));
        let cooling = state
            .last_views
            .get(&post_id)
            .is_some_and(|at| now.saturating_duration_since(*at) < self.view_cooldown);
        !pending && !cooling
    }

    pub fn confirm_view(&self, post_id: PostId) {
        self.confirm_view_at(post_id, Instant::now());
    }

    /// Start the cooldown and count the view on a tracked post
    pub fn confirm_view_at(&self, post_id: PostId, now: Instant) {
        let mut state = lock(&self.state);
        state.clear_pending(MutationKind::View, post_id);
        state.last_views.insert(post_id, now);
        if let Some(record) = state.interactions.get_mut(&post_id) {
            record.views_count += 1;
        }
    }

    pub fn reset_view_tracking(&self) {
        lock(&self.state).last_views.clear();
    }

    /// Merge pushed fields into an existing record. Untracked posts are
    /// ignored.
    pub fn update_post_data(&self, post_id: PostId, patch: &InteractionPatch) -> bool {
        match lock(&self.state).interactions.get_mut(&post_id) {
            Some(record) => {
                record.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Another user's like changed the count. The local flag is untouched.
    pub fn apply_live_likes(&self, post_id: PostId, likes_count: u64) -> bool {
        self.update_post_data(
            post_id,
            &InteractionPatch {
                likes_count: Some(likes_count),
                ..Default::default()
            },
        )
    }
}

/// Repost ids come back as `r_<id>`
fn parse_repost_id(raw: &str) -> Option<PostId> {
    raw.strip_prefix("r_").unwrap_or(raw).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(is_liked: bool, likes_count: u64) -> InteractionSnapshot {
        InteractionSnapshot {
            is_liked,
            likes_count,
            reposts_count: 2,
            views_count: 10,
            ..Default::default()
        }
    }

    fn store_with(post_id: PostId, snap: InteractionSnapshot) -> InteractionStore {
        let store = InteractionStore::default();
        store.initialize(post_id, snap);
        store
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = store_with(1, snapshot(false, 3));
        store.initialize(1, snapshot(true, 99));

        let record = store.get(1);
        assert!(!record.is_liked);
        assert_eq!(record.likes_count, 3);
    }

    #[test]
    fn test_untracked_post_reads_as_default() {
        let store = InteractionStore::default();
        assert_eq!(store.get(5), PostInteraction::default());
        assert!(!store.contains(5));
    }

    #[test]
    fn test_optimistic_like_adjusts_count() {
        let store = store_with(1, snapshot(false, 3));

        let attempt = store.optimistic_toggle(ToggleKind::Like, 1);
        assert!(attempt.tracked());
        assert!(!attempt.previous());
        assert_eq!(store.get(1).likes_count, 4);
        assert!(store.get(1).is_liked);
        assert!(store.is_pending(MutationKind::Like, 1));

        store.revert_toggle(attempt);
        assert!(!store.is_pending(MutationKind::Like, 1));
    }

    #[test]
    fn test_revert_restores_like_exactly() {
        let store = store_with(1, snapshot(true, 5));

        let attempt = store.optimistic_toggle(ToggleKind::Like, 1);
        assert_eq!(store.get(1).likes_count, 4);
        store.revert_toggle(attempt);

        let record = store.get(1);
        assert!(record.is_liked);
        assert_eq!(record.likes_count, 5);
    }

    #[test]
    fn test_revert_after_saturated_unlike() {
        // Server said liked with zero likes; unliking cannot go below zero
        let store = store_with(1, snapshot(true, 0));

        let attempt = store.optimistic_toggle(ToggleKind::Like, 1);
        assert_eq!(store.get(1).likes_count, 0);
        store.revert_toggle(attempt);

        let record = store.get(1);
        assert!(record.is_liked);
        assert_eq!(record.likes_count, 0);
    }

    #[test]
    fn test_overlapping_likes_revert_in_fifo_order() {
        let store = store_with(1, snapshot(false, 3));

        let first = store.optimistic_toggle(ToggleKind::Like, 1);
        let second = store.optimistic_toggle(ToggleKind::Like, 1);
        assert!(!store.get(1).is_liked);
        assert_eq!(store.get(1).likes_count, 3);

        store.revert_toggle(first);
        store.revert_toggle(second);

        let record = store.get(1);
        assert!(!record.is_liked);
        assert_eq!(record.likes_count, 3);
    }

    #[test]
    fn test_overlapping_bookmarks_revert_out_of_order() {
        let store = InteractionStore::default();
        store.initialize(1, InteractionSnapshot::default());

        let first = store.optimistic_toggle(ToggleKind::Bookmark, 1);
        let second = store.optimistic_toggle(ToggleKind::Bookmark, 1);
        let third = store.optimistic_toggle(ToggleKind::Bookmark, 1);
        assert!(store.get(1).is_bookmarked);

        store.revert_toggle(second);
        store.revert_toggle(first);
        store.revert_toggle(third);
        assert!(!store.get(1).is_bookmarked);
    }

    #[test]
    fn test_overlapping_confirms_last_one_wins() {
        let store = store_with(1, snapshot(false, 3));

        let first = store.optimistic_toggle(ToggleKind::Like, 1);
        let second = store.optimistic_toggle(ToggleKind::Like, 1);

        // The second request's answer arrives first
        store.confirm_toggle(second, &ToggleOutcome::Like(LikeResponse { is_liked: false, likes_count: 3 }));
        store.confirm_toggle(first, &ToggleOutcome::Like(LikeResponse { is_liked: true, likes_count: 4 }));

        let record = store.get(1);
        assert!(record.is_liked);
        assert_eq!(record.likes_count, 4);
        assert!(!store.is_pending(MutationKind::Like, 1));
    }

    #[test]
    fn test_confirm_overrides_local_estimate() {
        let store = store_with(1, snapshot(false, 3));

        let first = store.optimistic_toggle(ToggleKind::Like, 1);
        store.confirm_toggle(
            first,
            &ToggleOutcome::Like(LikeResponse {
                is_liked: true,
                likes_count: 7,
            }),
        );

        let record = store.get(1);
        assert!(record.is_liked);
        assert_eq!(record.likes_count, 7);
    }

    #[test]
    fn test_confirm_creates_missing_record() {
        let store = InteractionStore::default();

        let attempt = store.optimistic_toggle(ToggleKind::Bookmark, 9);
        assert!(!attempt.tracked());
        assert!(!store.contains(9));

        store.confirm_toggle(attempt, &ToggleOutcome::Bookmark(BookmarkResponse { is_bookmarked: true }));
        assert!(store.get(9).is_bookmarked);
    }

    #[test]
    fn test_revert_untracked_is_noop() {
        let store = InteractionStore::default();
        let attempt = store.optimistic_toggle(ToggleKind::Like, 9);
        store.revert_toggle(attempt);

        assert!(!store.contains(9));
        assert!(!store.is_pending(MutationKind::Like, 9));
    }

    #[test]
    fn test_repost_confirm_updates_new_repost() {
        let store = store_with(1, snapshot(false, 0));
        store.initialize(50, snapshot(false, 0));

        let attempt = store.optimistic_toggle(ToggleKind::Repost, 1);
        assert!(store.get(1).is_reposted);

        store.confirm_toggle(
            attempt,
            &ToggleOutcome::Repost(RepostResponse {
                repost_count: 3,
                new_post_id: Some("r_50".to_string()),
            }),
        );

        assert_eq!(store.get(1).reposts_count, 3);
        assert!(store.get(50).is_reposted);
        assert_eq!(store.get(50).reposts_count, 3);
    }

    #[test]
    fn test_toggle_clears_previous_error() {
        let store = store_with(1, snapshot(false, 0));
        store.record_error(MutationKind::Like, "boom");

        let attempt = store.optimistic_toggle(ToggleKind::Like, 1);
        assert_eq!(store.error(MutationKind::Like), None);
        store.revert_toggle(attempt);
    }

    #[test]
    fn test_fail_mutation_records_error() {
        let store = InteractionStore::default();
        store.begin_mutation(MutationKind::Share, 1);
        assert!(store.is_pending(MutationKind::Share, 1));

        store.fail_mutation(MutationKind::Share, 1, "Network error");
        assert!(!store.is_pending(MutationKind::Share, 1));
        assert_eq!(store.error(MutationKind::Share).as_deref(), Some("Network error"));

        store.clear_error(MutationKind::Share);
        assert_eq!(store.error(MutationKind::Share), None);
    }

    #[test]
    fn test_share_sets_count_and_copied_marker_expires() {
        let store = InteractionStore::default();
        store.begin_mutation(MutationKind::Share, 1);
        store.confirm_share(
            1,
            &ShareResponse {
                share_count: 4,
                short_url: None,
            },
        );
        assert_eq!(store.get(1).share_count, 4);

        let now = Instant::now();
        store.mark_share_copied_at(1, now);
        assert!(store.is_share_copied_at(1, now + Duration::from_millis(1500)));
        assert!(!store.is_share_copied_at(1, now + Duration::from_secs(2)));
        assert!(!store.is_share_copied_at(2, now));
    }

    #[test]
    fn test_view_cooldown() {
        let store = InteractionStore::new(Duration::from_secs(300));
        store.initialize(1, snapshot(false, 0));
        let now = Instant::now();

        assert!(store.should_record_view_at(1, now));
        store.begin_mutation(MutationKind::View, 1);
        assert!(!store.should_record_view_at(1, now));

        store.confirm_view_at(1, now);
        assert_eq!(store.get(1).views_count, 11);
        assert!(!store.should_record_view_at(1, now + Duration::from_secs(299)));
        assert!(store.should_record_view_at(1, now + Duration::from_secs(300)));

        store.confirm_view_at(1, now);
        store.reset_view_tracking();
        assert!(store.should_record_view_at(1, now));
    }

    #[test]
    fn test_live_likes_leave_flag_alone() {
        let store = store_with(42, snapshot(true, 3));

        assert!(store.apply_live_likes(42, 9));
        let record = store.get(42);
        assert_eq!(record.likes_count, 9);
        assert!(record.is_liked);

        assert!(!store.apply_live_likes(43, 1));
        assert!(!store.contains(43));
    }

    #[test]
    fn test_parse_repost_id() {
        assert_eq!(parse_repost_id("r_12"), Some(12));
        assert_eq!(parse_repost_id("12"), Some(12));
        assert_eq!(parse_repost_id("r_x"), None);
    }

    use proptest::prelude::*;

    fn toggle_kind() -> impl Strategy<Value = ToggleKind> {
        prop_oneof![
            Just(ToggleKind::Like),
            Just(ToggleKind::Repost),
            Just(ToggleKind::Bookmark),
        ]
    }

    proptest! {
        // Toggle then revert is the identity, for every kind and starting state
        #[test]
        fn prop_revert_restores_record(
            kind in toggle_kind(),
            is_liked in any::<bool>(),
            is_reposted in any::<bool>(),
            is_bookmarked in any::<bool>(),
            likes_count in 0u64..1000,
        ) {
            let store = InteractionStore::default();
            store.initialize(1, InteractionSnapshot {
                is_liked,
                likes_count,
                is_reposted,
                is_bookmarked,
                ..Default::default()
            });
            let before = store.get(1);

            let attempt = store.optimistic_toggle(kind, 1);
            store.revert_toggle(attempt);

            prop_assert_eq!(store.get(1), before);
            prop_assert!(!store.is_pending(kind.into(), 1));
        }

        // Overlapping likes reverted in the order they were issued end
        // where they started
        #[test]
        fn prop_overlapping_reverts_restore_record(
            toggles in 1usize..6,
            is_liked in any::<bool>(),
            extra in 0u64..1000,
        ) {
            let store = InteractionStore::default();
            store.initialize(1, InteractionSnapshot {
                is_liked,
                likes_count: toggles as u64 + extra,
                ..Default::default()
            });
            let before = store.get(1);

            let attempts: Vec<_> = (0..toggles)
                .map(|_| store.optimistic_toggle(ToggleKind::Like, 1))
                .collect();
            for attempt in attempts {
                store.revert_toggle(attempt);
            }

            prop_assert_eq!(store.get(1), before);
        }

        // Whatever was applied locally, the confirmed count is the server's
        #[test]
        fn prop_confirm_is_server_authoritative(
            toggles in 1usize..5,
            server_count in 0u64..1000,
            server_liked in any::<bool>(),
        ) {
            let store = InteractionStore::default();
            store.initialize(1, InteractionSnapshot::default());

            let mut attempts = Vec::new();
            for _ in 0..toggles {
                attempts.push(store.optimistic_toggle(ToggleKind::Like, 1));
            }
            for attempt in attempts {
                store.confirm_toggle(attempt, &ToggleOutcome::Like(LikeResponse {
                    is_liked: server_liked,
                    likes_count: server_count,
                }));
            }

            prop_assert_eq!(store.get(1).likes_count, server_count);
            prop_assert_eq!(store.get(1).is_liked, server_liked);
        }
    }
}
