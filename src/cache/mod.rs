//! Cache Module
//!
//! In-memory caching with per-entry TTL expiry, bounded capacity and
//! pattern-based invalidation.

mod clock;
mod entry;
mod key;
mod order;
mod stats;
mod store;


// Re-export public types
pub use clock::{duration_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use key::{CacheKey, KEY_SEPARATOR, PARAM_SEPARATOR};
pub use order::{EvictionOrder, EvictionPolicy};
pub use stats::CacheStats;
pub use store::CacheStore;
