//! Cache Key Module
//!
//! Deterministic key construction from a content type, an identifier and an
//! optional parameter set.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Separator between the type, identifier and parameter sections.
pub const KEY_SEPARATOR: char = ':';

/// Separator between individual `name:value` parameter pairs.
pub const PARAM_SEPARATOR: char = '|';

// == Cache Key ==
/// Rendered cache key such as `phase:3` or `training:abc:lang:en|draft:true`.
///
/// Keys are built by plain concatenation. An identifier that itself contains
/// `:` or `|` can collide with a differently-shaped key; this is a known edge
/// case and is left as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    // == Constructor ==
    /// Builds `"{content_type}:{identifier}"`.
    pub fn new(content_type: &str, identifier: impl fmt::Display) -> Self {
        Self(format!("{content_type}{KEY_SEPARATOR}{identifier}"))
    }

    // == Constructor With Params ==
    /// Builds a key with a parameter suffix.
    ///
    /// Parameters are sorted by name before rendering, so the order they are
    /// supplied in never changes the key. Later duplicates of the same name
    /// replace earlier ones. An empty parameter set yields the same key as
    /// [`CacheKey::new`].
    pub fn with_params<I, K, V>(content_type: &str, identifier: impl fmt::Display, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        let sorted: BTreeMap<String, String> = params
            .into_iter()
            .map(|(name, value)| (name.into(), value.to_string()))
            .collect();

        let mut key = Self::new(content_type, identifier);
        if sorted.is_empty() {
            return key;
        }

        let joined = sorted
            .iter()
            .map(|(name, value)| format!("{name}{KEY_SEPARATOR}{value}"))
            .collect::<Vec<_>>()
            .join(&PARAM_SEPARATOR.to_string());

        key.0.push(KEY_SEPARATOR);
        key.0.push_str(&joined);
        key
    }

    /// Returns the rendered key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the rendered string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_without_params() {
        assert_eq!(CacheKey::new("phase", 3).as_str(), "phase:3");
        assert_eq!(CacheKey::new("session", "abc-123").as_str(), "session:abc-123");
    }

    #[test]
    fn test_key_with_params_sorted() {
        let key = CacheKey::with_params("training", 7, [("lang", "en"), ("draft", "true")]);
        assert_eq!(key.as_str(), "training:7:draft:true|lang:en");
    }

    #[test]
    fn test_param_order_does_not_matter() {
        let a = CacheKey::with_params("quiz", 2, [("a", 1), ("b", 2), ("c", 3)]);
        let b = CacheKey::with_params("quiz", 2, [("c", 3), ("a", 1), ("b", 2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_params_match_plain_key() {
        let params: Vec<(String, String)> = Vec::new();
        assert_eq!(CacheKey::with_params("phase", 1, params), CacheKey::new("phase", 1));
    }

    #[test]
    fn test_duplicate_param_last_wins() {
        let key = CacheKey::with_params("phase", 1, [("lang", "en"), ("lang", "fr")]);
        assert_eq!(key.as_str(), "phase:1:lang:fr");
    }

    #[test]
    fn test_separator_collision_edge_case() {
        // Identifiers containing the separator can alias a parameterised key.
        let plain = CacheKey::new("phase", "1:lang:en");
        let with_params = CacheKey::with_params("phase", 1, [("lang", "en")]);
        assert_eq!(plain, with_params);
    }

    #[test]
    fn test_key_serializes_as_string() {
        let json = serde_json::to_string(&CacheKey::new("phase", 3)).unwrap();
        assert_eq!(json, "\"phase:3\"");
    }
}
