//! Crew Content Cache - in-process cache for crew onboarding content
//!
//! Shields the database from repeated reads of slowly-changing training
//! content with TTL expiry, bounded eviction and pattern invalidation.

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod tasks;

pub use cache::{CacheKey, CacheStats, CacheStore, EvictionPolicy};
pub use config::CacheConfig;
pub use content::{ContentCache, ContentType, JsonContentCache};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
