//! Traits and structs for cache store interaction.
//!
//! The cache store is a process-wide mapping from [`CacheKey`](folio_core::CacheKey)
//! to [`CacheEntry`](folio_core::CacheEntry), split into named partitions that are
//! versioned as a unit. If you want to plug in your own store, implement [`Backend`].
mod backend;
mod error;
mod memory;
pub mod partition;

pub use backend::{Backend, BackendResult};
pub use error::BackendError;
pub use memory::MemoryBackend;
pub use partition::{PartitionKind, Partitions};

/// Status of a partition delete.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Partition deleted together with this many entries.
    Deleted(u32),
    /// Partition already missing.
    Missing,
}
