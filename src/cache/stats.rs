//! Cache Statistics Module
//!
//! Tracks usage counters and builds point-in-time snapshots of the store.

use serde::Serialize;

// == Counters ==
/// Running counters owned by the store.
///
/// All increments saturate so bookkeeping can never panic or abort a cache
/// operation. When disabled, recording is a no-op.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    enabled: bool,
    hits: u64,
    misses: u64,
    sets: u64,
    deletes: u64,
    evictions: u64,
}

impl Counters {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub(crate) fn record_hit(&mut self) {
        if self.enabled {
            self.hits = self.hits.saturating_add(1);
        }
    }

    pub(crate) fn record_miss(&mut self) {
        if self.enabled {
            self.misses = self.misses.saturating_add(1);
        }
    }

    pub(crate) fn record_set(&mut self) {
        if self.enabled {
            self.sets = self.sets.saturating_add(1);
        }
    }

    pub(crate) fn record_deletes(&mut self, count: usize) {
        if self.enabled {
            self.deletes = self.deletes.saturating_add(count as u64);
        }
    }

    pub(crate) fn record_eviction(&mut self) {
        if self.enabled {
            self.evictions = self.evictions.saturating_add(1);
        }
    }
}

// == Cache Stats ==
/// Read-only snapshot of the store.
///
/// `valid_entries + expired_entries == total_entries` at the moment the
/// snapshot is taken; expired entries that have not been swept yet are
/// counted separately from live ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently held, expired or not
    pub total_entries: usize,
    /// Entries that would be served by `get`
    pub valid_entries: usize,
    /// Entries past their TTL awaiting lazy removal or a sweep
    pub expired_entries: usize,
    /// Configured capacity
    pub max_size: usize,
    /// Store-wide default TTL in milliseconds
    pub default_ttl_ms: u64,
    /// Successful lookups
    pub hits: u64,
    /// Lookups that found nothing or an expired entry
    pub misses: u64,
    /// Writes
    pub sets: u64,
    /// Entries removed by delete, invalidation or clear
    pub deletes: u64,
    /// Entries removed to stay within capacity
    pub evictions: u64,
}

impl CacheStats {
    pub(crate) fn from_counters(counters: &Counters) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            sets: counters.sets,
            deletes: counters.deletes,
            evictions: counters.evictions,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits.saturating_add(self.misses);
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
