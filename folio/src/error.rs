//! Error types surfaced by the lifecycle and messaging surfaces.
//!
//! Request handling itself never fails: [`CacheProxy::handle`](crate::CacheProxy::handle)
//! always ends in an [`Outcome`](folio_core::Outcome). These errors only reach
//! the host on construction, lifecycle transitions and malformed client messages.

use folio_backend::BackendError;
use thiserror::Error;

use crate::config::ConfigError;

/// Error type for proxy setup and lifecycle operations.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The configuration is unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The cache store failed an operation that cannot degrade gracefully.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// A client message was not valid JSON or had an unknown type.
    #[error("malformed client message: {0}")]
    Message(#[from] serde_json::Error),
}
