//! Content Module
//!
//! Typed get-or-fetch access to training content (phase info, quizzes,
//! session training items) backed by the cache store.

mod cache;
mod content_type;
mod flight;

pub use cache::{ContentCache, JsonContentCache};
pub use content_type::ContentType;
