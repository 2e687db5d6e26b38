//! Network transport capability.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{ProxyRequest, ProxyResponse};

/// Reasons a network fetch was rejected.
///
/// Policy handlers treat every variant the same way: as a network failure
/// that falls through to the class's fallback path.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// DNS, connection or protocol failure.
    #[error("network error: {0}")]
    Network(Box<dyn std::error::Error + Send + Sync>),
    /// The fetch was aborted, typically because the page navigated away.
    #[error("fetch aborted")]
    Aborted,
    /// The transport gave up waiting.
    #[error("fetch timed out")]
    Timeout,
    /// The request could not be turned into a network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Trait for performing the underlying network fetch.
///
/// Implemented by the real transport (`folio-reqwest`) and by scripted fakes in
/// tests. Non-2xx answers are successful fetches; only a rejected operation is
/// an [`UpstreamError`].
///
/// # Examples
///
/// ```rust,ignore
/// use folio_core::{ProxyRequest, ProxyResponse, Upstream, UpstreamError};
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Upstream for Offline {
///     async fn fetch(&self, _req: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
///         Err(UpstreamError::Aborted)
///     }
/// }
/// ```
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs the fetch, honoring the request's mode and credentials policy.
    async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError>;
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Arc<U> {
    async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        (**self).fetch(request).await
    }
}

#[async_trait]
impl<U: Upstream + ?Sized> Upstream for Box<U> {
    async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        (**self).fetch(request).await
    }
}
