//! Per-class caching policy.
//!
//! [`Policy::for_class`] is the dispatch table from [`RoutingClass`] to the
//! strategy applied by [`CacheProxy`](crate::CacheProxy). It holds no state;
//! every request looks its policy up afresh.
//!
//! | Class | Strategy | Partition | Stamped | Network failure |
//! |---|---|---|---|---|
//! | short-TTL | cache-first if fresh | dynamic | yes | stale copy, else 408 |
//! | raw content | network-first | dynamic | yes | stale copy, else 408 |
//! | resizing CDN | cache-first | images | no | 404 |
//! | object storage | cache-first | images | no | 404 |
//! | local image | cache-first | images | no | stale copy, else 404 |
//! | static asset | cache-first | static | no | stale copy, else 404 |
//! | dynamic | network-first | dynamic | no | any partition, then app shell, else 503 |
//!
//! Never-cache requests have no policy and pass through.

use std::time::Duration;

use folio_backend::PartitionKind;
use folio_core::{RoutingClass, TrustedHost};
use http::StatusCode;

/// Order in which cache and network are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve any cached entry; fetch only on a miss.
    CacheFirst,
    /// Serve a cached entry younger than the given age; otherwise fetch.
    CacheFirstIfFresh(Duration),
    /// Always fetch; the cache is only consulted when the network fails.
    NetworkFirst,
}

/// Response produced when the network fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Synthetic response with this status.
    Status(StatusCode),
    /// Cached copy from the class's partition, else a synthetic response.
    StaleOr(StatusCode),
    /// Any partition by key, then the app shell document, else 503.
    AppShell,
}

/// Caching policy of one routing class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Cache and network order.
    pub strategy: Strategy,
    /// Partition the class reads from and writes to.
    pub partition: PartitionKind,
    /// Whether stored entries carry a fetch timestamp.
    pub stamp: bool,
    /// Network failure path.
    pub fallback: Fallback,
}

impl Policy {
    /// Policy of `class`, or `None` when the request must bypass the cache.
    pub fn for_class(class: RoutingClass, short_ttl: Duration) -> Option<Policy> {
        let policy = match class {
            RoutingClass::NeverCache => return None,
            RoutingClass::ShortTtl => Policy {
                strategy: Strategy::CacheFirstIfFresh(short_ttl),
                partition: PartitionKind::Dynamic,
                stamp: true,
                fallback: Fallback::StaleOr(StatusCode::REQUEST_TIMEOUT),
            },
            RoutingClass::CrossOriginTrusted(TrustedHost::Github) => Policy {
                strategy: Strategy::NetworkFirst,
                partition: PartitionKind::Dynamic,
                stamp: true,
                fallback: Fallback::StaleOr(StatusCode::REQUEST_TIMEOUT),
            },
            RoutingClass::CrossOriginTrusted(TrustedHost::Weserv | TrustedHost::R2) => Policy {
                strategy: Strategy::CacheFirst,
                partition: PartitionKind::Images,
                stamp: false,
                fallback: Fallback::Status(StatusCode::NOT_FOUND),
            },
            RoutingClass::LocalImage => Policy {
                strategy: Strategy::CacheFirst,
                partition: PartitionKind::Images,
                stamp: false,
                fallback: Fallback::StaleOr(StatusCode::NOT_FOUND),
            },
            RoutingClass::StaticAsset => Policy {
                strategy: Strategy::CacheFirst,
                partition: PartitionKind::Static,
                stamp: false,
                fallback: Fallback::StaleOr(StatusCode::NOT_FOUND),
            },
            RoutingClass::Dynamic => Policy {
                strategy: Strategy::NetworkFirst,
                partition: PartitionKind::Dynamic,
                stamp: false,
                fallback: Fallback::AppShell,
            },
        };
        Some(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn never_cache_bypasses() {
        assert_eq!(Policy::for_class(RoutingClass::NeverCache, TTL), None);
    }

    #[test]
    fn only_raw_content_is_stamped() {
        let stamped = [
            RoutingClass::ShortTtl,
            RoutingClass::CrossOriginTrusted(TrustedHost::Github),
            RoutingClass::CrossOriginTrusted(TrustedHost::Weserv),
            RoutingClass::CrossOriginTrusted(TrustedHost::R2),
            RoutingClass::LocalImage,
            RoutingClass::StaticAsset,
            RoutingClass::Dynamic,
        ]
        .into_iter()
        .filter(|class| Policy::for_class(*class, TTL).is_some_and(|policy| policy.stamp))
        .collect::<Vec<_>>();

        assert_eq!(
            stamped,
            vec![
                RoutingClass::ShortTtl,
                RoutingClass::CrossOriginTrusted(TrustedHost::Github)
            ]
        );
    }

    #[test]
    fn short_ttl_carries_configured_age() {
        let policy = Policy::for_class(RoutingClass::ShortTtl, TTL).unwrap();
        assert_eq!(policy.strategy, Strategy::CacheFirstIfFresh(TTL));
    }
}
