//! In-process store built on DashMap.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use folio_core::{CacheEntry, CacheKey};
use tracing::trace;

use crate::{Backend, BackendError, BackendResult, DeleteStatus};

#[derive(Debug, Default)]
struct Partition {
    created: u64,
    entries: DashMap<CacheKey, CacheEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    partitions: DashMap<String, Arc<Partition>>,
    sequence: AtomicU64,
    used_bytes: AtomicUsize,
    quota: Option<usize>,
}

/// Simple in-memory store.
///
/// Thread-safe and cheap to clone: clones share the same partitions.
/// An optional byte quota makes writes fail with
/// [`BackendError::QuotaExceeded`] once the budget is used up, like a browser
/// store running out of space.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// Creates an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes beyond `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        MemoryBackend {
            inner: Arc::new(Inner {
                quota: Some(bytes),
                ..Inner::default()
            }),
        }
    }

    /// Number of entries in a partition, `None` if the partition does not exist.
    pub fn len(&self, partition: &str) -> Option<usize> {
        self.inner
            .partitions
            .get(partition)
            .map(|slot| slot.entries.len())
    }

    /// Keys stored in a partition, sorted.
    pub fn keys(&self, partition: &str) -> Vec<CacheKey> {
        let mut keys: Vec<CacheKey> = self
            .inner
            .partitions
            .get(partition)
            .map(|slot| slot.entries.iter().map(|e| e.key().clone()).collect())
            .unwrap_or_else(Vec::new);
        keys.sort();
        keys
    }

    fn slot(&self, partition: &str) -> Arc<Partition> {
        self.inner
            .partitions
            .entry(partition.to_owned())
            .or_insert_with(|| {
                trace!(partition, "creating partition");
                Arc::new(Partition {
                    created: self.inner.sequence.fetch_add(1, Ordering::Relaxed),
                    entries: DashMap::new(),
                })
            })
            .clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn open(&self, partition: &str) -> BackendResult<()> {
        self.slot(partition);
        Ok(())
    }

    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        let slot = match self.inner.partitions.get(partition) {
            Some(slot) => slot.clone(),
            None => return Ok(None),
        };
        Ok(slot.entries.get(key).map(|entry| entry.clone()))
    }

    async fn write(
        &self,
        partition: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        let size = entry.memory_size();
        let replaced = self
            .inner
            .partitions
            .get(partition)
            .and_then(|slot| slot.entries.get(key).map(|previous| previous.memory_size()))
            .unwrap_or(0);
        // Reserve the new size up front; the replaced entry is released on insert.
        self.inner
            .used_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                let fits = self
                    .inner
                    .quota
                    .is_none_or(|quota| used.saturating_sub(replaced) + size <= quota);
                fits.then_some(used + size)
            })
            .map_err(|_| BackendError::QuotaExceeded)?;

        let slot = self.slot(partition);
        if let Some(previous) = slot.entries.insert(key.clone(), entry) {
            self.inner
                .used_bytes
                .fetch_sub(previous.memory_size(), Ordering::Relaxed);
        }
        Ok(())
    }

    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus> {
        match self.inner.partitions.remove(partition) {
            Some((_, slot)) => {
                let freed = slot
                    .entries
                    .iter()
                    .map(|entry| entry.memory_size())
                    .sum::<usize>();
                self.inner.used_bytes.fetch_sub(freed, Ordering::Relaxed);
                Ok(DeleteStatus::Deleted(slot.entries.len() as u32))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        let mut names = self
            .inner
            .partitions
            .iter()
            .map(|slot| (slot.created, slot.key().clone()))
            .collect::<Vec<_>>();
        names.sort_by_key(|(created, _)| *created);
        Ok(names.into_iter().map(|(_, name)| name).collect())
    }

    fn label(&self) -> &str {
        "memory"
    }
}
