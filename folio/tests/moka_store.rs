//! The proxy over the Moka store.

mod common;

use common::{MockUpstream, config, get};
use folio::{Backend, CacheProxy, CacheStatus, Lifecycle};
use folio_moka::MokaBackend;

#[tokio::test]
async fn covers_are_cached_in_moka_partitions() {
    let backend = MokaBackend::builder()
        .label("reader")
        .max_bytes(8 * 1024 * 1024)
        .build();
    let upstream = MockUpstream::new();
    upstream.respond("/covers/x.webp", "cover");
    let proxy = CacheProxy::new(backend.clone(), upstream.clone(), config()).unwrap();

    proxy.handle(get("/covers/x.webp")).await;
    proxy.offload().wait_idle().await;
    let second = proxy
        .handle(get("/covers/x.webp"))
        .await
        .into_response()
        .unwrap();

    assert_eq!(second.cache_status(), CacheStatus::Hit);
    assert_eq!(upstream.calls(), 1);
    assert_eq!(backend.partitions().await.unwrap(), vec!["images-v1"]);
}

#[tokio::test]
async fn version_bump_evicts_previous_moka_partitions() {
    let backend = MokaBackend::builder().max_entries(64).build();
    let upstream = MockUpstream::new();
    upstream.respond("/index.html", "<html>v1</html>");

    Lifecycle::new(backend.clone(), upstream.clone(), config())
        .start()
        .await
        .unwrap();

    let mut next = config();
    next.version = "v2".into();
    let report = Lifecycle::new(backend.clone(), upstream, next)
        .start()
        .await
        .unwrap();

    assert_eq!(report.deleted, vec!["static-v1"]);
    assert_eq!(backend.partitions().await.unwrap(), vec!["static-v2"]);
}
