//! Metrics declaration and recording.
//!
//! With the `metrics` feature enabled the proxy records counters through the
//! [`metrics`](https://docs.rs/metrics) facade, labelled by routing class.
//! Without it every recording function is an empty inline call.

use folio_core::{CacheStatus, RoutingClass};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of responses served from the cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "folio_cache_hit_total",
            "Total number of responses served from the cache."
        );
        "folio_cache_hit_total"
    };
    /// Track number of responses produced after a cache miss.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "folio_cache_miss_total",
            "Total number of responses produced after a cache miss."
        );
        "folio_cache_miss_total"
    };
    /// Track number of stale fallbacks served after a network failure.
    pub static ref CACHE_STALE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "folio_cache_stale_total",
            "Total number of stale cache fallbacks."
        );
        "folio_cache_stale_total"
    };
    /// Track number of rejected network fetches.
    pub static ref UPSTREAM_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "folio_upstream_failure_total",
            "Total number of network fetches that failed."
        );
        "folio_upstream_failure_total"
    };
    /// Track number of discarded store writes.
    pub static ref STORE_WRITE_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "folio_store_write_failure_total",
            "Total number of cache store writes that failed."
        );
        "folio_store_write_failure_total"
    };
}

/// Records where a produced response came from.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_status(class: RoutingClass, status: CacheStatus) {
    let counter = match status {
        CacheStatus::Hit => *CACHE_HIT_COUNTER,
        CacheStatus::Miss => *CACHE_MISS_COUNTER,
        CacheStatus::Stale => *CACHE_STALE_COUNTER,
    };
    metrics::counter!(counter, "class" => class.as_str()).increment(1);
}

/// Records a rejected network fetch.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_upstream_failure(class: RoutingClass) {
    metrics::counter!(*UPSTREAM_FAILURE_COUNTER, "class" => class.as_str()).increment(1);
}

/// Records a discarded store write.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_store_failure(class: RoutingClass) {
    metrics::counter!(*STORE_WRITE_FAILURE_COUNTER, "class" => class.as_str()).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_status(_class: RoutingClass, _status: CacheStatus) {}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_upstream_failure(_class: RoutingClass) {}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_store_failure(_class: RoutingClass) {}
