//! Partition behaviour of the Moka store.

use folio_backend::{Backend, DeleteStatus};
use folio_core::{CacheEntry, CacheKey, ProxyResponse};
use folio_moka::MokaBackend;
use http::StatusCode;

fn entry(body: Vec<u8>) -> CacheEntry {
    CacheEntry::from_response(&ProxyResponse::new(StatusCode::OK, body))
}

fn key(id: u32) -> CacheKey {
    CacheKey::new(format!("https://app.example/covers/{id}.webp"))
}

#[tokio::test]
async fn write_then_read_round_trips_through_partition() {
    let backend = MokaBackend::builder().max_entries(100).build();

    backend
        .write("images-v1", &key(1), entry(b"cover".to_vec()))
        .await
        .unwrap();

    let stored = backend.read("images-v1", &key(1)).await.unwrap().unwrap();
    assert_eq!(stored.body().as_ref(), b"cover");
    assert_eq!(backend.read("static-v1", &key(1)).await.unwrap(), None);
}

#[tokio::test]
async fn partitions_are_isolated_and_ordered() {
    let backend = MokaBackend::builder().label("reader").max_entries(100).build();

    backend.open("static-v2").await.unwrap();
    backend
        .write("images-v2", &key(1), entry(b"a".to_vec()))
        .await
        .unwrap();
    backend.open("dynamic-v2").await.unwrap();

    assert_eq!(backend.label(), "reader");
    assert_eq!(
        backend.partitions().await.unwrap(),
        vec!["static-v2", "images-v2", "dynamic-v2"]
    );
    assert!(backend.read_any(&key(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn removing_partition_drops_entries() {
    let backend = MokaBackend::builder().max_entries(100).build();
    for id in 0..3 {
        backend
            .write("images-v1", &key(id), entry(vec![0; 8]))
            .await
            .unwrap();
    }

    assert_eq!(
        backend.remove_partition("images-v1").await.unwrap(),
        DeleteStatus::Deleted(3)
    );
    assert_eq!(backend.read("images-v1", &key(0)).await.unwrap(), None);
    assert_eq!(
        backend.remove_partition("images-v1").await.unwrap(),
        DeleteStatus::Missing
    );
}

#[tokio::test]
async fn byte_capacity_evicts_within_partition() {
    let probe = entry(vec![0; 1024]);
    let single = key(1).as_str().len() + probe.memory_size();
    let backend = MokaBackend::builder()
        .max_bytes((single * 2) as u64)
        .build();

    for id in 1..=4 {
        backend
            .write("images-v1", &key(id), entry(vec![0; 1024]))
            .await
            .unwrap();
        backend.run_pending_tasks().await;
    }

    let mut present = 0;
    for id in 1..=4 {
        if backend.read("images-v1", &key(id)).await.unwrap().is_some() {
            present += 1;
        }
    }
    assert!(present <= 2, "expected at most two covers, found {present}");
}
