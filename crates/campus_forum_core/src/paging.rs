//! crates/campus_forum_core/src/paging.rs
//!
//! Pagination bookkeeping: the cursor tracker and the de-duplicating merge
//! used by every paginated list.

use crate::domain::{CommentId, Cursor};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Which list a cursor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The article's top-level comments.
    TopLevel,
    /// The replies under one top-level comment.
    Replies(CommentId),
}

/// Holds the "next page" cursor of every list in a thread.
///
/// A scope without a cursor has no further pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorTracker {
    cursors: HashMap<Scope, Cursor>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, scope: Scope) -> Option<&Cursor> {
        self.cursors.get(&scope)
    }

    /// Records the server's cursor for `scope`; `None` marks the list as complete.
    pub fn set(&mut self, scope: Scope, cursor: Option<Cursor>) {
        match cursor {
            Some(cursor) => {
                self.cursors.insert(scope, cursor);
            }
            None => {
                self.cursors.remove(&scope);
            }
        }
    }

    pub fn has_more(&self, scope: Scope) -> bool {
        self.cursors.contains_key(&scope)
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}

/// Appends the entries of `incoming` whose key is not present yet, in
/// server order. Returns how many were added.
///
/// Applying the same page twice leaves the list unchanged.
pub(crate) fn merge_unique<T, K, F>(existing: &mut Vec<T>, incoming: Vec<T>, key: F) -> usize
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen: HashSet<K> = existing.iter().map(&key).collect();
    let before = existing.len();
    for item in incoming {
        if seen.insert(key(&item)) {
            existing.push(item);
        }
    }
    existing.len() - before
}
