//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// A stored value with the time it was written and its own TTL.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insertion or last refresh timestamp (milliseconds)
    pub stored_at: u64,
    /// Time-to-live for this entry (milliseconds)
    pub ttl_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stored at `now` that lives for `ttl_ms`.
    pub fn new(value: V, now: u64, ttl_ms: u64) -> Self {
        Self {
            value,
            stored_at: now,
            ttl_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once the full TTL has elapsed,
    /// i.e. `now - stored_at >= ttl_ms`. A clock that reads earlier than
    /// `stored_at` counts as zero elapsed time.
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.stored_at) >= self.ttl_ms
    }

    // == Expires At ==
    /// Returns the timestamp at which this entry stops being served.
    pub fn expires_at(&self) -> u64 {
        self.stored_at.saturating_add(self.ttl_ms)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, `0` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> u64 {
        self.expires_at().saturating_sub(now)
    }
}
