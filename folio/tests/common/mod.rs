//! Shared fixtures: a scripted upstream, a failing store and proxy builders.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use folio::{
    Backend, BackendError, CacheEntry, CacheKey, CacheProxy, MemoryBackend, ProxyConfig,
    ProxyRequest, ProxyResponse, Upstream, UpstreamError,
};
use folio_backend::{BackendResult, DeleteStatus};
use http::{HeaderMap, HeaderValue, StatusCode, header};
use url::Url;

pub const ORIGIN: &str = "https://reader.example/";

/// Routes proxy logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> ProxyConfig {
    ProxyConfig::new(Url::parse(ORIGIN).unwrap())
}

pub fn url(url: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(url).unwrap()
}

pub fn get(target: &str) -> ProxyRequest {
    ProxyRequest::get(url(target))
}

pub fn key(target: &str) -> CacheKey {
    CacheKey::from(&url(target))
}

pub fn proxy(backend: MemoryBackend, upstream: MockUpstream) -> CacheProxy<MemoryBackend, MockUpstream> {
    CacheProxy::new(backend, upstream, config()).unwrap()
}

#[derive(Clone)]
enum Route {
    Respond {
        status: StatusCode,
        content_type: &'static str,
        body: Bytes,
    },
    Fail,
}

#[derive(Default)]
struct MockUpstreamInner {
    routes: DashMap<String, Route>,
    requests: Mutex<Vec<ProxyRequest>>,
    offline: AtomicBool,
}

/// Scripted network transport.
///
/// Routes match the full URL first, then the URL without its query. Unknown
/// URLs answer 404. Clones share routes and the request log.
#[derive(Clone, Default)]
pub struct MockUpstream {
    inner: Arc<MockUpstreamInner>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, target: &str, body: &'static str) -> &Self {
        self.respond_with(target, StatusCode::OK, "text/plain", body)
    }

    pub fn respond_with(
        &self,
        target: &str,
        status: StatusCode,
        content_type: &'static str,
        body: &'static str,
    ) -> &Self {
        self.inner.routes.insert(
            url(target).to_string(),
            Route::Respond {
                status,
                content_type,
                body: Bytes::from_static(body.as_bytes()),
            },
        );
        self
    }

    pub fn fail(&self, target: &str) -> &Self {
        self.inner.routes.insert(url(target).to_string(), Route::Fail);
        self
    }

    pub fn go_offline(&self) {
        self.inner.offline.store(true, Ordering::SeqCst);
    }

    pub fn go_online(&self) {
        self.inner.offline.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.inner.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProxyRequest> {
        self.inner.requests.lock().unwrap().clone()
    }

    fn route(&self, url: &Url) -> Option<Route> {
        if let Some(route) = self.inner.routes.get(url.as_str()) {
            return Some(route.clone());
        }
        let mut bare = url.clone();
        bare.set_query(None);
        self.inner.routes.get(bare.as_str()).map(|route| route.clone())
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        let route = self.route(request.url());
        self.inner.requests.lock().unwrap().push(request);

        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(UpstreamError::Network("offline".into()));
        }
        match route {
            Some(Route::Respond {
                status,
                content_type,
                body,
            }) => {
                let mut headers = HeaderMap::new();
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
                Ok(ProxyResponse::new(status, body).with_headers(headers))
            }
            Some(Route::Fail) => Err(UpstreamError::Aborted),
            None => Ok(ProxyResponse::new(StatusCode::NOT_FOUND, Bytes::new())),
        }
    }
}

/// Store whose every operation fails.
#[derive(Clone, Default)]
pub struct ErrorBackend;

fn broken() -> BackendError {
    BackendError::InternalError("store unavailable".into())
}

#[async_trait]
impl Backend for ErrorBackend {
    async fn open(&self, _partition: &str) -> BackendResult<()> {
        Err(broken())
    }

    async fn read(&self, _partition: &str, _key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        Err(broken())
    }

    async fn write(
        &self,
        _partition: &str,
        _key: &CacheKey,
        _entry: CacheEntry,
    ) -> BackendResult<()> {
        Err(broken())
    }

    async fn remove_partition(&self, _partition: &str) -> BackendResult<DeleteStatus> {
        Err(broken())
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        Err(broken())
    }

    fn label(&self) -> &str {
        "error"
    }
}

/// In-memory store whose named partition refuses to be deleted.
#[derive(Clone)]
pub struct StuckPartitionBackend {
    inner: MemoryBackend,
    stuck: &'static str,
}

impl StuckPartitionBackend {
    pub fn new(inner: MemoryBackend, stuck: &'static str) -> Self {
        StuckPartitionBackend { inner, stuck }
    }
}

#[async_trait]
impl Backend for StuckPartitionBackend {
    async fn open(&self, partition: &str) -> BackendResult<()> {
        self.inner.open(partition).await
    }

    async fn read(&self, partition: &str, key: &CacheKey) -> BackendResult<Option<CacheEntry>> {
        self.inner.read(partition, key).await
    }

    async fn write(
        &self,
        partition: &str,
        key: &CacheKey,
        entry: CacheEntry,
    ) -> BackendResult<()> {
        self.inner.write(partition, key, entry).await
    }

    async fn remove_partition(&self, partition: &str) -> BackendResult<DeleteStatus> {
        if partition == self.stuck {
            return Err(broken());
        }
        self.inner.remove_partition(partition).await
    }

    async fn partitions(&self) -> BackendResult<Vec<String>> {
        self.inner.partitions().await
    }

    fn label(&self) -> &str {
        "stuck"
    }
}
