//! Moka store implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use folio_backend::{Backend, BackendResult, DeleteStatus};
use folio_core::{CacheEntry, CacheKey};
use moka::future::Cache;
use smol_str::SmolStr;
use tracing::trace;

use crate::builder::{CacheFactory, MokaBackendBuilder, NoCapacity};

#[derive(Clone)]
struct Partition {
    created: u64,
    cache: Cache<CacheKey, CacheEntry>,
}

/// In-memory partitioned store powered by Moka.
///
/// Each partition is a separate `moka::future::Cache` with the same capacity
/// settings, created lazily on first open or write. Reads are lock-free;
/// writes to the same key resolve as last writer wins.
///
/// # Examples
///
/// ```
/// use folio_moka::MokaBackend;
///
/// let backend = MokaBackend::builder()
///     .label("reader")
///     .max_bytes(64 * 1024 * 1024)
///     .build();
/// ```
///
/// # Caveats
///
/// - Data is **not persisted** and is lost on process restart
/// - Capacity applies **per partition**, not to the store as a whole
/// - Eviction is **best-effort**: an entry may remain readable briefly after
///   Moka decides to evict it
#[derive(Clone)]
pub struct MokaBackend {
    partitions: Arc<DashMap<String, Partition>>,
    sequence: Arc<AtomicU64>,
    factory: CacheFactory,
    label: SmolStr,
}

impl std::fmt::Debug for MokaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("partitions", &self.partitions.len())
            .field("factory", &self.factory)
            .finish()
    }
}

impl MokaBackend {
    /// Creates a new builder for `MokaBackend`.
    ///
    /// Capacity must be configured with
    /// [`max_entries`](MokaBackendBuilder::max_entries) or
    /// [`max_bytes`](MokaBackendBuilder::max_bytes) before building.
    pub fn builder() -> MokaBackendBuilder<NoCapacity> {
        MokaBackendBuilder::new()
    }

    pub(crate) fn from_parts(factory: CacheFactory, label: SmolStr) -> Self {
        MokaBackend {
            partitions: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
            factory,
            label,
        }
    }

    /// Runs Moka's pending maintenance (evictions, counters) on every partition.
    pub async fn run_pending_tasks(&self) {
        let caches = self
            .partitions
            .iter()
            .map(|slot| slot.cache.clone())
            .collect::<Vec<_>>();
        for cache in caches {
            cache.run_pending_tasks().await;
        }
    }

    fn partition(&self, name: &str) -> Option<Partition> {
        self.partitions.get(name).map(|slot| slot.clone())
    }

    fn open_partition(&self, name: &str) -> Partition {
        self.partitions
            .entry(name.to_owned())
            .or_insert_with(|| {
                trace!(partition = name, label = %self.label, "creating moka partition");
                Partition {
                    created: self.sequence.fetch_add(1, Ordering::Relaxed),
                    cache: self.factory.build(),
                }
            })
            .clone()
    }
}

#[async_trait]
impl Backend for MokaBackend {
    async fn open(&self, partition: &str) -> BackendResult<()> {
        self.open_partition(partition);
        Ok(())
    }

    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        match self.partition(partition) {
            Some(slot) => Ok(slot.cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        partition: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        let slot = self.open_partition(partition);
        slot.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus> {
        match self.partitions.remove(partition) {
            Some((_, slot)) => {
                slot.cache.run_pending_tasks().await;
                let count = slot.cache.entry_count();
                slot.cache.invalidate_all();
                Ok(DeleteStatus::Deleted(count.min(u32::MAX as u64) as u32))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        let mut names = self
            .partitions
            .iter()
            .map(|slot| (slot.created, slot.key().clone()))
            .collect::<Vec<_>>();
        names.sort_by_key(|(created, _)| *created);
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    fn label(&self) -> &str {
        &self.label
    }
}
