//! Error types for store operations.

use thiserror::Error;

/// Error type for store operations.
///
/// The proxy never surfaces these to the web client: a failed read degrades to
/// a miss and a failed write degrades to "entry not cached".
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal store error, state or computation error.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send + Sync>),

    /// The store refused the write because it is out of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Serializing or deserializing an entry failed.
    #[error("entry serialization failed: {0}")]
    Serialization(String),
}
