//! Request handling.
//!
//! [`CacheProxy`] ties the pieces together: an intercepted request is
//! classified, its policy looked up, its key normalized, and then the cache
//! store and the network are consulted in the order the policy dictates.
//!
//! Nothing here returns an error to the caller. Network failures fall through
//! to the class's fallback, store read failures count as misses and store
//! write failures are logged and discarded.

use std::sync::Arc;

use folio_backend::{Backend, Partitions};
use folio_core::{
    CacheEntry, CacheKey, CacheStatus, Clock, Credentials, Outcome, ProxyRequest, ProxyResponse,
    RequestMode, RoutingClass, SystemClock, Upstream,
};
use http::{HeaderName, HeaderValue, Method, StatusCode};
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::classify::Classifier;
use crate::config::{ConfigError, ProxyConfig};
use crate::freshness::{self, Freshness};
use crate::metrics;
use crate::normalize::normalize;
use crate::offload::OffloadManager;
use crate::policy::{Fallback, Policy, Strategy};

/// Offline-capable caching proxy.
///
/// Generic over the cache store `B`, the network transport `U` and the
/// wall clock `C`. All three are injected, so tests substitute in-memory
/// fakes and a manual clock.
///
/// # Examples
///
/// ```rust,ignore
/// use folio::{CacheProxy, ProxyConfig};
/// use folio_backend::MemoryBackend;
///
/// let config = ProxyConfig::from_file("folio.yaml")?;
/// let proxy = CacheProxy::new(MemoryBackend::new(), upstream, config)?;
///
/// match proxy.handle(request).await {
///     Outcome::Respond(response) => render(response),
///     Outcome::PassThrough => forward(request),
/// }
/// ```
pub struct CacheProxy<B, U, C = SystemClock> {
    backend: Arc<B>,
    upstream: U,
    clock: C,
    config: Arc<ProxyConfig>,
    classifier: Classifier,
    partitions: Partitions,
    app_shell: CacheKey,
    status_header: Option<HeaderName>,
    offload: OffloadManager,
}

impl<B, U> CacheProxy<B, U, SystemClock>
where
    B: Backend + 'static,
    U: Upstream,
{
    /// Creates a proxy reading the system clock.
    ///
    /// Fails if the configuration does not validate.
    pub fn new(
        backend: B,
        upstream: U,
        config: impl Into<Arc<ProxyConfig>>,
    ) -> Result<Self, ConfigError> {
        let config = config.into();
        config.validate()?;

        let app_shell = CacheKey::from(&config.resolve(&config.app_shell)?);
        let status_header = config
            .cache_status_header
            .as_deref()
            .map(|name| HeaderName::from_bytes(name.as_bytes()))
            .transpose()
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        Ok(CacheProxy {
            backend: Arc::new(backend),
            upstream,
            clock: SystemClock,
            classifier: Classifier::new(config.clone()),
            partitions: Partitions::new(&config.version),
            config,
            app_shell,
            status_header,
            offload: OffloadManager::new(),
        })
    }
}

impl<B, U, C> CacheProxy<B, U, C> {
    /// Replaces the clock used for fetch timestamps and freshness checks.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> CacheProxy<B, U, C2> {
        CacheProxy {
            backend: self.backend,
            upstream: self.upstream,
            clock,
            config: self.config,
            classifier: self.classifier,
            partitions: self.partitions,
            app_shell: self.app_shell,
            status_header: self.status_header,
            offload: self.offload,
        }
    }

    /// Uses a shared offload manager for background store writes.
    pub fn with_offload(mut self, offload: OffloadManager) -> Self {
        self.offload = offload;
        self
    }

    /// Manager running background store writes.
    pub fn offload(&self) -> &OffloadManager {
        &self.offload
    }

    /// Active configuration.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Current partition names.
    pub fn partitions(&self) -> &Partitions {
        &self.partitions
    }

    /// The cache store.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The classifier used for incoming requests.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

impl<B, U, C> CacheProxy<B, U, C>
where
    B: Backend + 'static,
    U: Upstream,
    C: Clock,
{
    /// Handles one intercepted request.
    ///
    /// Returns [`Outcome::PassThrough`] for non-`GET` requests, never-cache
    /// requests and cross-origin hosts without a policy. Every other request
    /// gets a response, synthesized if need be.
    pub async fn handle(&self, request: ProxyRequest) -> Outcome {
        if request.method() != Method::GET {
            trace!(method = %request.method(), url = %request.url(), "non-GET request passes through");
            return Outcome::PassThrough;
        }
        let Some(class) = self.classifier.classify(&request) else {
            trace!(url = %request.url(), "no policy for host, passing through");
            return Outcome::PassThrough;
        };
        let span = debug_span!("proxy", class = class.as_str(), url = %request.url());
        self.dispatch(class, request).instrument(span).await
    }

    async fn dispatch(&self, class: RoutingClass, request: ProxyRequest) -> Outcome {
        let Some(policy) = Policy::for_class(class, self.config.short_ttl.max_age) else {
            debug!("never-cache request bypasses the cache");
            return Outcome::PassThrough;
        };
        let Some(key) = normalize(&request, class, &self.config.r2) else {
            return Outcome::PassThrough;
        };

        let response = match policy.strategy {
            Strategy::CacheFirst => self.cache_first(class, &policy, request, key, None).await,
            Strategy::CacheFirstIfFresh(max_age) => {
                self.cache_first(class, &policy, request, key, Some(max_age))
                    .await
            }
            Strategy::NetworkFirst => self.network_first(class, &policy, request, key).await,
        };

        metrics::record_cache_status(class, response.cache_status());
        Outcome::Respond(self.decorate(response))
    }

    async fn cache_first(
        &self,
        class: RoutingClass,
        policy: &Policy,
        request: ProxyRequest,
        key: CacheKey,
        max_age: Option<std::time::Duration>,
    ) -> ProxyResponse {
        let cached = self.read(policy, &key).await;
        if let Some(entry) = &cached {
            match max_age {
                None => {
                    debug!(%key, "cache hit");
                    return entry.to_response(CacheStatus::Hit);
                }
                Some(max_age) => match freshness::evaluate(entry, max_age, self.clock.now()) {
                    Freshness::Fresh => {
                        debug!(%key, "fresh cache hit");
                        return entry.to_response(CacheStatus::Hit);
                    }
                    Freshness::Expired => debug!(%key, "cached entry expired, refetching"),
                },
            }
        } else {
            debug!(%key, "cache miss");
        }

        match self.fetch(class, request).await {
            Some(response) => self.store_and_return(class, policy, key, response),
            None => self.fallback(policy, &key, cached).await,
        }
    }

    async fn network_first(
        &self,
        class: RoutingClass,
        policy: &Policy,
        request: ProxyRequest,
        key: CacheKey,
    ) -> ProxyResponse {
        match self.fetch(class, request).await {
            Some(response) => self.store_and_return(class, policy, key, response),
            None => {
                let stale = match policy.fallback {
                    Fallback::StaleOr(_) => self.read(policy, &key).await,
                    _ => None,
                };
                self.fallback(policy, &key, stale).await
            }
        }
    }

    /// Performs the network fetch. `None` means the fetch was rejected.
    async fn fetch(&self, class: RoutingClass, request: ProxyRequest) -> Option<ProxyResponse> {
        let request = if class.is_cross_origin() {
            request.with_mode(RequestMode::Cors, Credentials::Omit)
        } else {
            request
        };
        match self.upstream.fetch(request).await {
            Ok(response) => Some(response),
            Err(err) => {
                warn!(error = %err, "network fetch failed");
                metrics::record_upstream_failure(class);
                None
            }
        }
    }

    fn store_and_return(
        &self,
        class: RoutingClass,
        policy: &Policy,
        key: CacheKey,
        response: ProxyResponse,
    ) -> ProxyResponse {
        if response.is_success() {
            let mut entry = CacheEntry::from_response(&response);
            if policy.stamp {
                entry = entry.stamped(self.clock.now());
            }
            self.store(class, policy, key, entry);
        } else {
            debug!(status = %response.status(), "non-success response is not stored");
        }
        response.with_cache_status(CacheStatus::Miss)
    }

    fn store(&self, class: RoutingClass, policy: &Policy, key: CacheKey, entry: CacheEntry) {
        let backend = self.backend.clone();
        let partition = self.partitions.name(policy.partition).to_owned();
        self.offload.spawn("store", async move {
            match backend.write(&partition, &key, entry).await {
                Ok(()) => trace!(%key, partition = %partition, "entry stored"),
                Err(err) => {
                    warn!(
                        %key,
                        partition = %partition,
                        error = %err,
                        "store write failed, entry not cached"
                    );
                    metrics::record_store_failure(class);
                }
            }
        });
    }

    async fn read(&self, policy: &Policy, key: &CacheKey) -> Option<CacheEntry> {
        let partition = self.partitions.name(policy.partition);
        match self.backend.read(partition, key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%key, partition, error = %err, "store read failed, treating as miss");
                None
            }
        }
    }

    async fn read_any(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.backend.read_any(key).await {
            Ok(entry) => entry,
            Err(err) => {
                warn!(%key, error = %err, "store read failed, treating as miss");
                None
            }
        }
    }

    async fn fallback(
        &self,
        policy: &Policy,
        key: &CacheKey,
        stale: Option<CacheEntry>,
    ) -> ProxyResponse {
        match policy.fallback {
            Fallback::Status(status) => ProxyResponse::placeholder(status),
            Fallback::StaleOr(status) => match stale {
                Some(entry) => {
                    warn!(%key, "network failed, serving stale copy");
                    entry.to_response(CacheStatus::Stale)
                }
                None => ProxyResponse::placeholder(status),
            },
            Fallback::AppShell => {
                if let Some(entry) = self.read_any(key).await {
                    warn!(%key, "network failed, serving cached copy");
                    return entry.to_response(CacheStatus::Stale);
                }
                if let Some(entry) = self.read_any(&self.app_shell).await {
                    warn!(%key, shell = %self.app_shell, "network failed, serving app shell");
                    return entry.to_response(CacheStatus::Stale);
                }
                warn!(%key, "network failed and nothing cached, offline");
                ProxyResponse::placeholder(StatusCode::SERVICE_UNAVAILABLE)
            }
        }
    }

    fn decorate(&self, mut response: ProxyResponse) -> ProxyResponse {
        if let Some(name) = &self.status_header {
            let value = HeaderValue::from_static(response.cache_status().as_header_value());
            response.headers_mut().insert(name.clone(), value);
        }
        response
    }
}
