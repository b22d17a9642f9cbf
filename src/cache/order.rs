//! Eviction Order Module
//!
//! Tracks which key is the next eviction candidate when the store is full.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

// == Eviction Policy ==
/// Chooses which events move a key to the "newest" end of the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Evict the entry with the oldest `stored_at`. Only writes refresh an
    /// entry's position; reading an old entry does not protect it.
    #[default]
    OldestInsertion,
    /// Evict the least recently accessed entry. Successful reads refresh the
    /// position as well as writes.
    LeastRecentlyUsed,
}

impl EvictionPolicy {
    /// Parses a policy name as used in configuration (`insertion` or `lru`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "insertion" | "fifo" | "oldest_insertion" => Some(Self::OldestInsertion),
            "lru" | "least_recently_used" => Some(Self::LeastRecentlyUsed),
            _ => None,
        }
    }

    /// Whether a successful read should promote the key.
    pub fn promotes_on_read(self) -> bool {
        matches!(self, Self::LeastRecentlyUsed)
    }
}

// == Eviction Order ==
/// Ordered set of keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = most recently written (or read, under LRU)
/// - Back = next eviction candidate
#[derive(Debug, Default)]
pub struct EvictionOrder {
    order: VecDeque<String>,
}

impl EvictionOrder {
    // == Constructor ==
    /// Creates a new empty order.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Moves `key` to the front, inserting it if it was not tracked.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_front(key.to_string());
    }

    // == Remove ==
    /// Stops tracking `key`.
    pub fn remove(&mut self, key: &str) {
        self.order.retain(|k| k != key);
    }

    // == Pop Oldest ==
    /// Removes and returns the eviction candidate.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_back()
    }

    // == Peek Oldest ==
    /// Returns the eviction candidate without removing it.
    #[cfg(test)]
    pub(crate) fn peek_oldest(&self) -> Option<&str> {
        self.order.back().map(String::as_str)
    }

    /// Drops every tracked key.
    pub fn clear(&mut self) {
        self.order.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }
}
