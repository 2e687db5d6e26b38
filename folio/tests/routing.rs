//! Requests the proxy must not intercept.

mod common;

use common::{MockUpstream, get, proxy};
use folio::{Backend, MemoryBackend, ProxyRequest};
use http::Method;

#[tokio::test]
async fn never_cache_paths_pass_through_without_touching_store() {
    let backend = MemoryBackend::new();
    let upstream = MockUpstream::new();
    let proxy = proxy(backend.clone(), upstream.clone());

    for target in [
        "/manifest.json",
        "/version.txt?ts=1700000000",
        "https://raw.githubusercontent.com/org/data/main/enc/manifest.json",
        "https://images.weserv.nl/?url=reader.example/version.txt",
    ] {
        assert!(proxy.handle(get(target)).await.is_pass_through(), "{target}");
    }
    proxy.offload().wait_idle().await;

    assert_eq!(upstream.calls(), 0);
    assert!(backend.partitions().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_get_requests_pass_through() {
    let upstream = MockUpstream::new();
    let proxy = proxy(MemoryBackend::new(), upstream.clone());

    let post = ProxyRequest::new(Method::POST, common::url("/api/ratings"));
    assert!(proxy.handle(post).await.is_pass_through());

    let put = ProxyRequest::new(Method::PUT, common::url("/covers/x.webp"));
    assert!(proxy.handle(put).await.is_pass_through());
    assert_eq!(upstream.calls(), 0);
}

#[tokio::test]
async fn unknown_cross_origin_hosts_pass_through() {
    let backend = MemoryBackend::new();
    let upstream = MockUpstream::new();
    let proxy = proxy(backend.clone(), upstream.clone());

    let outcome = proxy
        .handle(get("https://fonts.example/inter.woff2"))
        .await;

    assert!(outcome.is_pass_through());
    assert_eq!(upstream.calls(), 0);
    assert!(backend.partitions().await.unwrap().is_empty());
}
