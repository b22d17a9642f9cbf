//! Content Cache
//!
//! Get-or-populate access to onboarding content on top of [`CacheStore`], with
//! per-type TTLs, single-flight fetches and an owned cleanup sweeper.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use tokio::runtime::Handle;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{duration_ms, CacheKey, CacheStats, CacheStore, Clock, SystemClock};
use crate::config::CacheConfig;
use crate::content::flight::InFlight;
use crate::content::ContentType;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_cleanup_task;

/// Content cache holding type-erased JSON payloads.
pub type JsonContentCache<C = SystemClock> = ContentCache<serde_json::Value, C>;

// == Content Cache ==
/// Shared content cache.
///
/// Constructed explicitly and passed to whoever needs it; there is no global
/// instance. The cleanup sweeper only runs between [`start`](Self::start) and
/// [`stop`](Self::stop), and is stopped when the cache is dropped.
pub struct ContentCache<V, C = SystemClock> {
    store: Arc<RwLock<CacheStore<V, C>>>,
    in_flight: InFlight,
    cleanup_interval: Duration,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> ContentCache<V, SystemClock>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache from configuration using the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<V, C> ContentCache<V, C>
where
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Creates a cache from configuration reading time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: C) -> Self {
        Self::from_store(
            CacheStore::from_config_with_clock(config, clock),
            config.cleanup_interval(),
        )
    }

    /// Wraps an already built store.
    pub fn from_store(store: CacheStore<V, C>, cleanup_interval: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            in_flight: InFlight::new(),
            cleanup_interval,
            sweeper: Mutex::new(None),
        }
    }

    /// Shared handle to the underlying store.
    pub fn store(&self) -> Arc<RwLock<CacheStore<V, C>>> {
        Arc::clone(&self.store)
    }

    // == Direct Access ==
    /// Looks up a content item without fetching on miss.
    pub async fn get(&self, content_type: ContentType, identifier: impl fmt::Display) -> Option<V> {
        self.get_key(&CacheKey::new(content_type.as_str(), identifier)).await
    }

    /// Looks up an already built key, e.g. one carrying parameters.
    pub async fn get_key(&self, key: &CacheKey) -> Option<V> {
        self.store.write().await.get(key)
    }

    /// Stores a content item with the type's default TTL unless overridden.
    pub async fn set(
        &self,
        content_type: ContentType,
        identifier: impl fmt::Display,
        value: V,
        ttl: Option<Duration>,
    ) -> V {
        let key = CacheKey::new(content_type.as_str(), identifier);
        let ttl = ttl.unwrap_or_else(|| content_type.default_ttl());
        self.set_key(key, value, ttl).await
    }

    /// Stores `value` under an already built key for `ttl`.
    pub async fn set_key(&self, key: CacheKey, value: V, ttl: Duration) -> V {
        self.store.write().await.set(key, value, Some(ttl))
    }

    /// Removes a single rendered key.
    pub async fn delete(&self, key: &CacheKey) -> bool {
        self.store.write().await.delete(key)
    }

    // == Get Or Fetch ==
    /// Returns the cached item or fetches and caches it.
    ///
    /// On a hit `fetch` is never called. On a miss, `fetch` runs and an
    /// `Ok(Some(value))` is stored with the type's default TTL, or
    /// `ttl_override` when given. `Ok(None)` is returned without caching and
    /// `Err` is returned unchanged, so failures are never cached.
    pub async fn get_or_fetch<F, Fut, E>(
        &self,
        content_type: ContentType,
        identifier: impl fmt::Display,
        fetch: F,
        ttl_override: Option<Duration>,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        let key = CacheKey::new(content_type.as_str(), identifier);
        let ttl = ttl_override.unwrap_or_else(|| content_type.default_ttl());
        self.get_or_fetch_key(key, ttl, fetch).await
    }

    /// Get-or-fetch for an already built key, e.g. one carrying parameters.
    ///
    /// Concurrent misses on the same key are serialized: the first caller
    /// fetches while the rest wait, then re-check the cache. A successful
    /// fetch therefore reaches upstream once. If it fails or yields nothing,
    /// the next waiter fetches on its own.
    pub async fn get_or_fetch_key<F, Fut, E>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        if let Some(value) = self.store.write().await.get(&key) {
            return Ok(Some(value));
        }

        let _permit = self.in_flight.acquire(key.as_str()).await;

        // Another caller may have filled the key while we waited.
        {
            let mut store = self.store.write().await;
            if let Some(value) = store.peek(&key).cloned() {
                store.promote(&key);
                debug!(key = %key, "Filled by concurrent fetch");
                return Ok(Some(value));
            }
        }

        match fetch().await? {
            Some(value) => {
                debug!(key = %key, ttl_ms = duration_ms(ttl), "Caching fetched content");
                Ok(Some(self.store.write().await.set(key, value, Some(ttl))))
            }
            None => Ok(None),
        }
    }

    // == Content Helpers ==
    /// Phase info; drafts are cached under their own, shorter-lived type.
    pub async fn phase_info<F, Fut, E>(
        &self,
        phase: u32,
        published: bool,
        fetch: F,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        let content_type = if published {
            ContentType::Phase
        } else {
            ContentType::Draft
        };
        self.get_or_fetch(content_type, phase, fetch, None).await
    }

    /// Quiz content for a phase.
    pub async fn quiz_content<F, Fut, E>(&self, phase: u32, fetch: F) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        self.get_or_fetch(ContentType::Quiz, phase, fetch, None).await
    }

    /// Training items for one onboarding session.
    pub async fn training_items<F, Fut, E>(
        &self,
        session_id: &str,
        fetch: F,
    ) -> std::result::Result<Option<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Option<V>, E>>,
    {
        self.get_or_fetch(ContentType::Session, session_id, fetch, None).await
    }

    // == Invalidation ==
    /// Drops one item, including every parameterised variant of its key.
    ///
    /// Matches `{type}:{identifier}` exactly or followed by `:`, so
    /// invalidating phase 3 leaves phase 30 alone.
    pub async fn invalidate(&self, content_type: ContentType, identifier: impl fmt::Display) -> usize {
        let prefix = CacheKey::new(content_type.as_str(), identifier);
        let regex = exact_key_regex(prefix.as_str());
        self.store.write().await.invalidate_matching(&regex)
    }

    /// Drops every item of one content type.
    pub async fn invalidate_type(&self, content_type: ContentType) -> usize {
        let regex = exact_key_regex(content_type.as_str());
        self.store.write().await.invalidate_matching(&regex)
    }

    /// Drops every key matching a caller-supplied regular expression.
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize> {
        self.store.write().await.invalidate_pattern(pattern)
    }

    /// Drops everything. Returns the number of entries removed.
    pub async fn invalidate_all(&self) -> usize {
        self.store.write().await.clear()
    }

    // == Maintenance ==
    /// Sweeps expired entries now rather than waiting for the sweeper.
    pub async fn cleanup(&self) -> usize {
        self.store.write().await.cleanup()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    /// Number of keys that currently have a fetch running or waiting.
    pub fn in_flight_fetches(&self) -> usize {
        self.in_flight.len()
    }

    // == Sweeper Lifecycle ==
    /// Starts the periodic cleanup sweeper on the current Tokio runtime.
    ///
    /// Does nothing if it is already running.
    pub fn start(&self) -> Result<()> {
        Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let mut sweeper = self.sweeper.lock();
        if sweeper.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(());
        }

        *sweeper = Some(spawn_cleanup_task(self.store(), self.cleanup_interval));
        Ok(())
    }

    /// Stops the cleanup sweeper. Returns whether one was running.
    pub fn stop(&self) -> bool {
        match self.sweeper.lock().take() {
            Some(handle) => {
                handle.abort();
                info!("TTL cleanup task stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweeper and drops every entry. Returns the number removed.
    pub async fn destroy(self) -> usize {
        self.stop();
        self.invalidate_all().await
    }
}

impl<V, C> Drop for ContentCache<V, C> {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

/// `^{prefix}(:|$)` with the prefix escaped.
fn exact_key_regex(prefix: &str) -> Regex {
    let pattern = format!("^{}(:|$)", regex::escape(prefix));
    Regex::new(&pattern).expect("escaped key prefix should compile - this is a bug")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{EvictionPolicy, ManualClock};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn new_cache() -> (ContentCache<String, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (ContentCache::with_clock(&CacheConfig::default(), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_set_uses_type_ttl() {
        let (cache, clock) = new_cache();

        cache.set(ContentType::Session, "s1", "items".to_string(), None).await;
        clock.advance(ContentType::Session.default_ttl() - Duration::from_millis(1));
        assert!(cache.get(ContentType::Session, "s1").await.is_some());

        clock.advance_ms(2);
        assert!(cache.get(ContentType::Session, "s1").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_fetch_caches_value() {
        let (cache, _) = new_cache();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch(
                    ContentType::Phase,
                    1,
                    || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, String>(Some("Fire Safety".to_string()))
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(value.as_deref(), Some("Fire Safety"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_fetch_none_not_cached() {
        let (cache, _) = new_cache();

        let value = cache
            .get_or_fetch(ContentType::Quiz, 9, || async { Ok::<_, String>(None) }, None)
            .await
            .unwrap();

        assert!(value.is_none());
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_get_or_fetch_error_passes_through() {
        let (cache, _) = new_cache();

        let result = cache
            .get_or_fetch(
                ContentType::Training,
                4,
                || async { Err::<Option<String>, _>("db down".to_string()) },
                None,
            )
            .await;

        assert_eq!(result, Err("db down".to_string()));
        assert_eq!(cache.stats().await.total_entries, 0);
        assert_eq!(cache.in_flight_fetches(), 0);
    }

    #[tokio::test]
    async fn test_ttl_override() {
        let (cache, clock) = new_cache();

        cache
            .get_or_fetch(
                ContentType::Quiz,
                2,
                || async { Ok::<_, String>(Some("q".to_string())) },
                Some(Duration::from_millis(100)),
            )
            .await
            .unwrap();

        clock.advance_ms(100);
        assert!(cache.get(ContentType::Quiz, 2).await.is_none());
    }

    #[tokio::test]
    async fn test_phase_info_draft_uses_draft_type() {
        let (cache, _) = new_cache();

        cache
            .phase_info(3, false, || async { Ok::<_, String>(Some("draft".to_string())) })
            .await
            .unwrap();

        assert!(cache.get(ContentType::Draft, 3).await.is_some());
        assert!(cache.get(ContentType::Phase, 3).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_is_exact() {
        let (cache, _) = new_cache();

        cache.set(ContentType::Phase, 3, "three".to_string(), None).await;
        cache.set(ContentType::Phase, 30, "thirty".to_string(), None).await;
        let with_params = CacheKey::with_params("phase", 3, [("lang", "en")]);
        cache
            .set_key(with_params.clone(), "en".to_string(), Duration::from_secs(60))
            .await;

        assert_eq!(cache.invalidate(ContentType::Phase, 3).await, 2);
        assert!(cache.get(ContentType::Phase, 30).await.is_some());
        assert!(cache.get_key(&with_params).await.is_none());
    }

    #[tokio::test]
    async fn test_get_and_set_by_key() {
        let (cache, clock) = new_cache();
        let key = CacheKey::with_params("training", 4, [("lang", "fr")]);

        let stored = cache
            .set_key(key.clone(), "fr".to_string(), Duration::from_millis(50))
            .await;
        assert_eq!(stored, "fr");
        assert_eq!(cache.get_key(&key).await, Some("fr".to_string()));
        assert!(cache.get(ContentType::Training, 4).await.is_none());

        clock.advance_ms(50);
        assert!(cache.get_key(&key).await.is_none());
    }

    #[tokio::test]
    async fn test_waiter_hit_refreshes_lru_position() {
        let config = CacheConfig {
            max_size: 2,
            eviction_policy: EvictionPolicy::LeastRecentlyUsed,
            ..CacheConfig::default()
        };
        let cache: ContentCache<String, ManualClock> =
            ContentCache::with_clock(&config, ManualClock::new());
        let calls = AtomicUsize::new(0);

        let permit = cache.in_flight.acquire("phase:1").await;

        let (waited, ()) = tokio::join!(
            cache.get_or_fetch(
                ContentType::Phase,
                1,
                || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(Some("fetched".to_string()))
                },
                None,
            ),
            async {
                // The waiter has missed and is parked on the gate by now
                tokio::task::yield_now().await;
                cache.set(ContentType::Phase, 1, "one".to_string(), None).await;
                cache.set(ContentType::Phase, 2, "two".to_string(), None).await;
                drop(permit);
            },
        );

        assert_eq!(waited.unwrap(), Some("one".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // phase:1 was read last, so phase:2 is the candidate
        cache.set(ContentType::Phase, 3, "three".to_string(), None).await;
        assert!(cache.get(ContentType::Phase, 1).await.is_some());
        assert!(cache.get(ContentType::Phase, 2).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_type_and_all() {
        let (cache, _) = new_cache();

        cache.set(ContentType::Training, 1, "a".to_string(), None).await;
        cache.set(ContentType::Training, 2, "b".to_string(), None).await;
        cache.set(ContentType::Quiz, 1, "c".to_string(), None).await;

        assert_eq!(cache.invalidate_type(ContentType::Training).await, 2);
        assert_eq!(cache.invalidate_all().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_pattern_error() {
        let (cache, _) = new_cache();
        let result = cache.invalidate_pattern("[").await;
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_stop() {
        let (cache, _) = new_cache();

        assert!(!cache.is_running());
        cache.start().unwrap();
        cache.start().unwrap();
        assert!(cache.is_running());

        assert!(cache.stop());
        assert!(!cache.stop());
        assert!(!cache.is_running());
    }

    #[test]
    fn test_start_outside_runtime() {
        let (cache, _) = new_cache();
        assert!(matches!(cache.start(), Err(CacheError::NoRuntime)));
    }

    #[test]
    fn test_exact_key_regex_escapes() {
        let regex = exact_key_regex("session:a.b");
        assert!(regex.is_match("session:a.b"));
        assert!(regex.is_match("session:a.b:lang:en"));
        assert!(!regex.is_match("session:aXb"));
        assert!(!regex.is_match("session:a.bc"));
    }
}
