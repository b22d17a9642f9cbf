//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with an eviction order, per-entry
//! TTL expiry and pattern invalidation.

use std::collections::HashMap;
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::cache::{
    duration_ms, CacheEntry, CacheKey, CacheStats, Clock, EvictionOrder, EvictionPolicy, SystemClock,
};
use crate::cache::stats::Counters;
use crate::config::CacheConfig;
use crate::error::Result;

// == Cache Store ==
/// Bounded, TTL-expiring key/value store.
///
/// Not internally synchronized; share it behind a lock (see
/// [`ContentCache`](crate::content::ContentCache)) when it needs more than one owner.
#[derive(Debug)]
pub struct CacheStore<V, C = SystemClock> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Eviction candidate tracking
    order: EvictionOrder,
    policy: EvictionPolicy,
    counters: Counters,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    default_ttl_ms: u64,
    clock: C,
}

impl<V: Clone> CacheStore<V, SystemClock> {
    // == Constructor ==
    /// Creates a store with statistics enabled and oldest-insertion eviction.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries; values below 1 are raised to 1
    /// * `default_ttl` - TTL for entries stored without an explicit one
    pub fn new(max_size: usize, default_ttl: Duration) -> Self {
        Self::with_clock(max_size, default_ttl, SystemClock)
    }

    /// Creates a store from a loaded configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::from_config_with_clock(config, SystemClock)
    }
}

impl<V: Clone, C: Clock> CacheStore<V, C> {
    /// Creates a store reading time from `clock`.
    pub fn with_clock(max_size: usize, default_ttl: Duration, clock: C) -> Self {
        Self {
            entries: HashMap::new(),
            order: EvictionOrder::new(),
            policy: EvictionPolicy::default(),
            counters: Counters::new(true),
            max_size: max_size.max(1),
            default_ttl_ms: duration_ms(default_ttl),
            clock,
        }
    }

    /// Creates a store from a loaded configuration, reading time from `clock`.
    pub fn from_config_with_clock(config: &CacheConfig, clock: C) -> Self {
        Self::with_clock(config.max_size, config.default_ttl(), clock)
            .with_eviction_policy(config.eviction_policy)
            .with_stats(config.enable_stats)
    }

    /// Selects the eviction policy. Must be chosen before any entry is stored.
    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables or disables usage counters.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.counters = Counters::new(enabled);
        self
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` when the key is absent or expired. Expired entries are
    /// removed on the way out and counted as misses.
    pub fn get(&mut self, key: &CacheKey) -> Option<V> {
        let now = self.clock.now_ms();
        let key = key.as_str();

        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                self.counters.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.counters.record_miss();
            debug!(key, "Expired entry removed on read");
            return None;
        }

        let value = self.entries.get(key).map(|entry| entry.value.clone());
        if self.policy.promotes_on_read() {
            self.order.touch(key);
        }
        self.counters.record_hit();
        value
    }

    // == Peek ==
    /// Reads a live value without recording statistics or affecting eviction
    /// order. Expired entries read as `None` but are left for the sweeper.
    pub fn peek(&self, key: &CacheKey) -> Option<&V> {
        let now = self.clock.now_ms();
        self.entries
            .get(key.as_str())
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.value)
    }

    // == Promote ==
    /// Moves a held key to the newest end of the eviction order when the
    /// policy refreshes on reads. A no-op under `OldestInsertion`.
    pub fn promote(&mut self, key: &CacheKey) {
        if self.policy.promotes_on_read() && self.entries.contains_key(key.as_str()) {
            self.order.touch(key.as_str());
        }
    }

    // == Set ==
    /// Stores `value` under `key` and returns it.
    ///
    /// Overwriting an existing key resets its `stored_at` and TTL. When a new
    /// key would exceed capacity, the current eviction candidate is dropped
    /// first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the store default if None)
    pub fn set(&mut self, key: CacheKey, value: V, ttl: Option<Duration>) -> V {
        let key = key.into_string();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            self.evict_one();
        }

        let ttl_ms = ttl.map_or(self.default_ttl_ms, duration_ms);
        let entry = CacheEntry::new(value.clone(), self.clock.now_ms(), ttl_ms);
        self.entries.insert(key.clone(), entry);
        self.order.touch(&key);
        self.counters.record_set();

        value
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether anything was removed.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        let removed = self.remove_entry(key.as_str());
        if removed {
            self.counters.record_deletes(1);
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every entry whose key matches the regular expression `pattern`.
    ///
    /// Returns the number of entries removed, or
    /// [`CacheError::InvalidPattern`](crate::error::CacheError::InvalidPattern)
    /// if `pattern` does not compile.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> Result<usize> {
        let regex = Regex::new(pattern)?;
        Ok(self.invalidate_matching(&regex))
    }

    /// Removes every entry whose key matches a precompiled expression.
    pub fn invalidate_matching(&mut self, regex: &Regex) -> usize {
        let matched: Vec<String> = self
            .entries
            .keys()
            .filter(|key| regex.is_match(key.as_str()))
            .cloned()
            .collect();

        for key in &matched {
            self.remove_entry(key);
        }

        self.counters.record_deletes(matched.len());
        debug!(pattern = regex.as_str(), removed = matched.len(), "Pattern invalidation");
        matched.len()
    }

    // == Clear ==
    /// Removes all entries. Returns the number removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.counters.record_deletes(count);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, read or not.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        debug!(removed = expired_keys.len(), "Expired entries swept");
        expired_keys.len()
    }

    // == Stats ==
    /// Returns a snapshot of counters and entry counts.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();

        CacheStats {
            total_entries: self.entries.len(),
            valid_entries: self.entries.len() - expired,
            expired_entries: expired,
            max_size: self.max_size,
            default_ttl_ms: self.default_ttl_ms,
            ..CacheStats::from_counters(&self.counters)
        }
    }

    /// Whether `key` is held and not expired.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.peek(key).is_some()
    }

    /// Every held key, expired or not, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of entries held, including expired ones not yet removed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.policy
    }

    fn evict_one(&mut self) {
        if let Some(evicted) = self.order.pop_oldest() {
            self.entries.remove(&evicted);
            self.counters.record_eviction();
            debug!(key = %evicted, "Evicted entry to stay within capacity");
        }
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }
}
