//! crates/campus_forum_core/src/inflight.rs
//!
//! In-flight guards for controller operations. At most one instance of a
//! logical operation runs at a time; a duplicate is refused with `Busy`.

use crate::error::{ForumError, ForumResult};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// The set of operations currently running.
pub(crate) struct InFlight<K> {
    active: Arc<Mutex<HashSet<K>>>,
}

impl<K> Default for InFlight<K> {
    fn default() -> Self {
        Self {
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl<K: Eq + Hash + Clone + Display> InFlight<K> {
    /// Marks `key` as running. The mark is removed when the guard drops,
    /// including when the owning future is dropped mid-flight.
    pub(crate) fn try_begin(&self, key: K) -> ForumResult<FlightGuard<K>> {
        if !self.active.lock().insert(key.clone()) {
            debug!("Refusing duplicate {}", key);
            return Err(ForumError::Busy(key.to_string()));
        }
        Ok(FlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self, key: &K) -> bool {
        self.active.lock().contains(key)
    }
}

#[must_use = "the operation is only marked running while the guard lives"]
pub(crate) struct FlightGuard<K: Eq + Hash> {
    active: Arc<Mutex<HashSet<K>>>,
    key: K,
}

impl<K: Eq + Hash> Drop for FlightGuard<K> {
    fn drop(&mut self) {
        self.active.lock().remove(&self.key);
    }
}
