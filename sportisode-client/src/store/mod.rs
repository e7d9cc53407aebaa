//! Client-side caches the UI reads from.
//!
//! Each store is a `Mutex` around plain keyed maps and is shared through
//! `Arc`. Every method is one short critical section; no lock is held
//! across an `.await`.

mod comments;
mod feed;
mod interactions;
mod thread;

pub use comments::{CommentComposition, CommentStore, PostComments};
pub use feed::{FeedStore, HomeFeedState};
pub use interactions::{InteractionStore, ToggleAttempt, ToggleOutcome};
pub use thread::group_comments_into_threads;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A panic while holding a store lock leaves plain data behind, so a
/// poisoned lock is still safe to read.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
