//! Builder for configuring [`MokaBackend`].

use folio_core::{CacheEntry, CacheKey};
use moka::future::{Cache, CacheBuilder};
use moka::policy::EvictionPolicy;
use smol_str::SmolStr;

use crate::backend::MokaBackend;

/// Marker type: capacity has not been configured yet.
///
/// This is the initial state of a [`MokaBackendBuilder`]. You must call either
/// [`max_entries()`](MokaBackendBuilder::max_entries) or
/// [`max_bytes()`](MokaBackendBuilder::max_bytes) before calling `build()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapacity;

/// Marker type: entry-count capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct EntryCapacity(pub(crate) u64);

/// Marker type: byte-based capacity has been configured.
#[derive(Debug, Clone, Copy)]
pub struct ByteCapacity(pub(crate) u64);

#[derive(Debug, Clone, Copy)]
enum Capacity {
    Entries(u64),
    Bytes(u64),
}

/// Recipe for the per-partition caches of one [`MokaBackend`].
#[derive(Clone)]
pub(crate) struct CacheFactory {
    capacity: Capacity,
    eviction_policy: EvictionPolicy,
}

impl std::fmt::Debug for CacheFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFactory")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl CacheFactory {
    pub(crate) fn build(&self) -> Cache<CacheKey, CacheEntry> {
        match self.capacity {
            Capacity::Entries(entries) => CacheBuilder::new(entries)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
            Capacity::Bytes(bytes) => CacheBuilder::new(bytes)
                .weigher(byte_weigher)
                .eviction_policy(self.eviction_policy.clone())
                .build(),
        }
    }
}

/// Approximate byte cost of a stored entry.
fn byte_weigher(key: &CacheKey, entry: &CacheEntry) -> u32 {
    (key.as_str().len() + entry.memory_size()).min(u32::MAX as usize) as u32
}

/// Builder for creating and configuring a [`MokaBackend`].
///
/// Use [`MokaBackend::builder`] to create a new builder instance. Capacity is
/// required and applies to each partition separately:
/// - [`max_entries(n)`](Self::max_entries) - limit by entry count
/// - [`max_bytes(n)`](Self::max_bytes) - limit by approximate memory usage
///
/// `build()` is only available after capacity is set.
pub struct MokaBackendBuilder<Cap> {
    capacity: Cap,
    label: SmolStr,
    eviction_policy: Option<EvictionPolicy>,
}

impl MokaBackendBuilder<NoCapacity> {
    /// Creates a new builder with no capacity configured.
    pub fn new() -> Self {
        Self {
            capacity: NoCapacity,
            label: SmolStr::new_static("moka"),
            eviction_policy: None,
        }
    }

    /// Sets the maximum number of entries each partition can hold.
    pub fn max_entries(self, capacity: u64) -> MokaBackendBuilder<EntryCapacity> {
        MokaBackendBuilder {
            capacity: EntryCapacity(capacity),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Sets the approximate memory budget of each partition, in bytes.
    ///
    /// Covers images are large and uneven in size, so a byte budget usually
    /// tracks real memory use better than an entry count.
    pub fn max_bytes(self, bytes: u64) -> MokaBackendBuilder<ByteCapacity> {
        MokaBackendBuilder {
            capacity: ByteCapacity(bytes),
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }
}

impl Default for MokaBackendBuilder<NoCapacity> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Cap> MokaBackendBuilder<Cap> {
    /// Sets a custom label for this store, used in logs.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<SmolStr>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy.
    ///
    /// # Default
    ///
    /// - entry-based capacity: [`EvictionPolicy::tiny_lfu()`]
    /// - byte-based capacity: [`EvictionPolicy::lru()`], since TinyLFU admission
    ///   can reject a large cover even when eviction could make room
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }
}

impl MokaBackendBuilder<EntryCapacity> {
    /// Builds the [`MokaBackend`] with entry-count based capacity.
    pub fn build(self) -> MokaBackend {
        let factory = CacheFactory {
            capacity: Capacity::Entries(self.capacity.0),
            eviction_policy: self
                .eviction_policy
                .unwrap_or_else(EvictionPolicy::tiny_lfu),
        };
        MokaBackend::from_parts(factory, self.label)
    }
}

impl MokaBackendBuilder<ByteCapacity> {
    /// Builds the [`MokaBackend`] with byte-based capacity.
    pub fn build(self) -> MokaBackend {
        let factory = CacheFactory {
            capacity: Capacity::Bytes(self.capacity.0),
            eviction_policy: self.eviction_policy.unwrap_or_else(EvictionPolicy::lru),
        };
        MokaBackend::from_parts(factory, self.label)
    }
}
