#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Routing classification of intercepted requests.
///
/// [`Classifier`](classify::Classifier) maps each request to exactly one
/// [`RoutingClass`], or to no class at all for cross-origin hosts the proxy
/// does not manage.
pub mod classify;

/// Client messaging channel.
pub mod clients;

/// Deployment configuration loaded from YAML.
pub mod config;

/// Error types for setup, lifecycle and messaging.
pub mod error;

/// Time-based validity of cached entries.
pub mod freshness;

/// Install, activation and cache clearing.
pub mod lifecycle;

/// Metrics collection for cache observability.
///
/// When the `metrics` feature is enabled, this module provides counters for:
/// - Cache hits, misses and stale fallbacks
/// - Rejected network fetches
/// - Discarded store writes
pub mod metrics;

/// Cache key normalization.
pub mod normalize;

/// Background task offloading for fire-and-forget store writes.
pub mod offload;

/// Per-class caching policy dispatch table.
pub mod policy;

mod proxy;

pub use classify::Classifier;
pub use clients::{ClientHandle, ClientMessage, ClientNotification, Clients};
pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use lifecycle::{ActivationReport, InstallReport, Lifecycle, LifecycleState};
pub use offload::OffloadManager;
pub use proxy::CacheProxy;

pub use folio_backend::{Backend, BackendError, MemoryBackend, PartitionKind, Partitions};
pub use folio_core::{
    CacheEntry, CacheKey, CacheStatus, Clock, Credentials, Outcome, ProxyRequest, ProxyResponse,
    RequestMode, RoutingClass, SystemClock, TrustedHost, Upstream, UpstreamError,
};
