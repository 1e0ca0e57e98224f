//! Optional filter for inbound records the session has already rendered
//!
//! The transport may deliver the same message through both the history fetch
//! and the live-event hook. When enabled, the session remembers the ids it has
//! ingested during this conversation, oldest first, and drops repeats. Records
//! without an `id` cannot be matched and always pass.

use std::collections::{HashSet, VecDeque};

/// Ids remembered per session before the oldest is forgotten
const DEFAULT_CAPACITY: usize = 1000;

/// Bounded, insertion-ordered set of message ids seen in one conversation
#[derive(Debug)]
pub struct RecordDedup {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for RecordDedup {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecordDedup {
    /// Remember at most `capacity` ids
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record `id`, returning `true` if this conversation already delivered it
    pub fn is_duplicate(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return true;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());
        false
    }

    /// Number of remembered ids
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no ids are remembered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_is_duplicate() {
        let mut dedup = RecordDedup::default();
        assert!(!dedup.is_duplicate("msg-1"));
        assert!(dedup.is_duplicate("msg-1"));
        assert!(!dedup.is_duplicate("msg-2"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn full_cache_forgets_oldest_first() {
        let mut dedup = RecordDedup::with_capacity(2);
        assert!(!dedup.is_duplicate("a"));
        assert!(!dedup.is_duplicate("b"));
        assert!(!dedup.is_duplicate("c"));

        assert_eq!(dedup.len(), 2);
        assert!(dedup.is_duplicate("c"));
        assert!(dedup.is_duplicate("b"));
        assert!(!dedup.is_duplicate("a"));
    }

    #[test]
    fn repeat_does_not_refresh_position() {
        let mut dedup = RecordDedup::with_capacity(2);
        dedup.is_duplicate("a");
        dedup.is_duplicate("b");
        assert!(dedup.is_duplicate("a"));

        dedup.is_duplicate("c");
        assert!(!dedup.is_duplicate("a"));
    }
}
