//! Error types for the content cache
//!
//! Misses are `None`, never errors. Fetch failures keep the caller's own
//! error type and pass through untouched.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors surfaced by cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalidation pattern is not a valid regular expression
    #[error("Invalid invalidation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Background sweeper was started outside a Tokio runtime
    #[error("Cleanup task requires a running Tokio runtime")]
    NoRuntime,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
