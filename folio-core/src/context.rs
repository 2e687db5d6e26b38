//! Cache status of a produced response.

/// Whether the response came from the cache, the network, or a stale fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Served from the cache store without touching the network.
    Hit,
    /// Fetched from the network (or synthesized after a miss).
    #[default]
    Miss,
    /// Served from the cache after the network failed or the entry expired.
    Stale,
}

impl CacheStatus {
    /// Returns the status as a string slice.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Stale => "stale",
        }
    }

    /// Returns the status in the upper-case form used for response headers.
    #[inline]
    pub const fn as_header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}
