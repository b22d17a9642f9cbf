//! Configuration Module
//!
//! Loads cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::EvictionPolicy;

const DEFAULT_MAX_SIZE: usize = 1000;
const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;
const DEFAULT_CLEANUP_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Default TTL in milliseconds for entries without explicit TTL
    pub default_ttl_ms: u64,
    /// Background sweep interval in milliseconds
    pub cleanup_interval_ms: u64,
    /// Whether hit/miss/set/delete/eviction counters are recorded
    pub enable_stats: bool,
    /// Which entry is evicted when the cache is full
    pub eviction_policy: EvictionPolicy,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 300000)
    /// - `CACHE_ENABLE_STATS` - `true`/`false` (default: true)
    /// - `CACHE_EVICTION_POLICY` - `insertion` or `lru` (default: insertion)
    ///
    /// Values that fail to parse fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: parse_var("CACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            default_ttl_ms: parse_var("CACHE_DEFAULT_TTL_MS").unwrap_or(defaults.default_ttl_ms),
            cleanup_interval_ms: parse_var("CACHE_CLEANUP_INTERVAL_MS")
                .unwrap_or(defaults.cleanup_interval_ms),
            enable_stats: parse_var("CACHE_ENABLE_STATS").unwrap_or(defaults.enable_stats),
            eviction_policy: env::var("CACHE_EVICTION_POLICY")
                .ok()
                .and_then(|v| EvictionPolicy::parse(&v))
                .unwrap_or(defaults.eviction_policy),
        }
    }

    /// Default TTL as a `Duration`.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// Sweep interval as a `Duration`, never shorter than one millisecond.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cleanup_interval_ms.max(1))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            default_ttl_ms: DEFAULT_TTL_MS,
            cleanup_interval_ms: DEFAULT_CLEANUP_INTERVAL_MS,
            enable_stats: true,
            eviction_policy: EvictionPolicy::OldestInsertion,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 5] = [
        "CACHE_MAX_SIZE",
        "CACHE_DEFAULT_TTL_MS",
        "CACHE_CLEANUP_INTERVAL_MS",
        "CACHE_ENABLE_STATS",
        "CACHE_EVICTION_POLICY",
    ];

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 1000);
        assert_eq!(config.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(300));
        assert!(config.enable_stats);
        assert_eq!(config.eviction_policy, EvictionPolicy::OldestInsertion);
    }

    #[test]
    fn test_config_zero_cleanup_interval_floors_to_one_ms() {
        let config = CacheConfig {
            cleanup_interval_ms: 0,
            ..CacheConfig::default()
        };
        assert_eq!(config.cleanup_interval(), Duration::from_millis(1));
    }

    // Both env cases live in one test so they never race on the process env.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("CACHE_MAX_SIZE", "100");
        env::set_var("CACHE_DEFAULT_TTL_MS", "600000");
        env::set_var("CACHE_CLEANUP_INTERVAL_MS", "not-a-number");
        env::set_var("CACHE_ENABLE_STATS", "false");
        env::set_var("CACHE_EVICTION_POLICY", "lru");

        let config = CacheConfig::from_env();
        assert_eq!(config.max_size, 100);
        assert_eq!(config.default_ttl_ms, 600_000);
        assert_eq!(config.cleanup_interval_ms, 300_000);
        assert!(!config.enable_stats);
        assert_eq!(config.eviction_policy, EvictionPolicy::LeastRecentlyUsed);

        for var in VARS {
            env::remove_var(var);
        }
    }
}
