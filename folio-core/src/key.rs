//! Normalized cache keys.
//!
//! A [`CacheKey`] is the identity under which a [`CacheEntry`](crate::CacheEntry)
//! is stored and looked up. For most routing classes it is the full request URL,
//! query included, because the query selects the content variant (image width,
//! quality, format). Token-bearing CDN URLs are normalized first so that rotating
//! credentials map onto a single key.
//!
//! ```
//! use folio_core::CacheKey;
//! use url::Url;
//!
//! let url = Url::parse("https://images.weserv.nl/?url=a.jpg&w=300").unwrap();
//! let key = CacheKey::from(&url);
//! assert_eq!(key.as_str(), "https://images.weserv.nl/?url=a.jpg&w=300");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

/// Canonical identity of a cached response.
///
/// Backed by [`SmolStr`], so cloning is O(1): short keys are stored inline and
/// long keys share one reference-counted allocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(SmolStr);

impl CacheKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<SmolStr>) -> Self {
        CacheKey(key.into())
    }

    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&Url> for CacheKey {
    fn from(url: &Url) -> Self {
        CacheKey(SmolStr::new(url.as_str()))
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        CacheKey(SmolStr::new(key))
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_keeps_query_string() {
        let url = Url::parse("https://app.example/covers/x.webp?v=2").unwrap();
        assert_eq!(
            CacheKey::from(&url).as_str(),
            "https://app.example/covers/x.webp?v=2"
        );
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let key = CacheKey::new("https://app.example/index.html");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"https://app.example/index.html\"");
    }
}
