use std::sync::Arc;

use async_trait::async_trait;
use folio_core::{CacheEntry, CacheKey};

use crate::{BackendError, DeleteStatus};

pub type BackendResult<T> = Result<T, BackendError>;

/// Partitioned key-value cache store.
///
/// Operations are atomic per key: concurrent writes to the same key resolve as
/// last writer wins, with no merging. Writing into a partition that does not
/// exist yet creates it, mirroring [`open`](Backend::open).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Opens a partition, creating it if missing.
    async fn open(&self, partition: &str) -> BackendResult<()>;

    /// Looks up `key` in one partition. A missing partition is a miss.
    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>>;

    /// Stores `entry` under `key`, replacing any previous entry.
    async fn write(&self, partition: &str, key: &CacheKey, entry: CacheEntry)
    -> BackendResult<()>;

    /// Deletes a partition and every entry in it.
    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus>;

    /// Lists partition names in creation order.
    async fn partitions(&self) -> BackendResult<Vec<String>>;

    /// Looks up `key` across all partitions, oldest partition first.
    async fn read_any(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        for partition in self.partitions().await? {
            if let Some(entry) = self.read(&partition, key).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Returns the label of this store for logs and metrics.
    fn label(&self) -> &str {
        "backend"
    }
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Arc<B> {
    async fn open(&self, partition: &str) -> BackendResult<()> {
        (**self).open(partition).await
    }

    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read(partition, key).await
    }

    async fn write(
        &self,
        partition: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        (**self).write(partition, key, entry).await
    }

    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus> {
        (**self).remove_partition(partition).await
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        (**self).partitions().await
    }

    async fn read_any(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read_any(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

#[async_trait]
impl<B: Backend + ?Sized> Backend for Box<B> {
    async fn open(&self, partition: &str) -> BackendResult<()> {
        (**self).open(partition).await
    }

    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read(partition, key).await
    }

    async fn write(
        &self,
        partition: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        (**self).write(partition, key, entry).await
    }

    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus> {
        (**self).remove_partition(partition).await
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        (**self).partitions().await
    }

    async fn read_any(&self, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        (**self).read_any(key).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}
