//! Time-based validity of cached entries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use folio_core::CacheEntry;

/// Result of a freshness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The entry is younger than the maximum age.
    Fresh,
    /// The entry is too old or carries no fetch time.
    Expired,
}

/// Checks `entry` against `max_age` at time `now`.
///
/// The entry is fresh iff `now - fetched_at < max_age`, in milliseconds. An
/// entry without a fetch time is expired, so it is always refetched.
pub fn evaluate(entry: &CacheEntry, max_age: Duration, now: DateTime<Utc>) -> Freshness {
    let Some(fetched_at) = entry.fetched_at() else {
        return Freshness::Expired;
    };
    let age = now.timestamp_millis() - fetched_at.timestamp_millis();
    let max_age = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    if age < max_age {
        Freshness::Fresh
    } else {
        Freshness::Expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use folio_core::ProxyResponse;
    use http::StatusCode;

    const FIVE_MINUTES: Duration = Duration::from_millis(300_000);

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    fn entry() -> CacheEntry {
        CacheEntry::from_response(&ProxyResponse::new(StatusCode::OK, "[]"))
    }

    #[test]
    fn fresh_until_just_before_max_age() {
        let stored = entry().stamped(at(1_000_000));
        assert_eq!(evaluate(&stored, FIVE_MINUTES, at(1_000_000)), Freshness::Fresh);
        assert_eq!(
            evaluate(&stored, FIVE_MINUTES, at(1_000_000 + 299_999)),
            Freshness::Fresh
        );
        assert_eq!(
            evaluate(&stored, FIVE_MINUTES, at(1_000_000 + 300_000)),
            Freshness::Expired
        );
        assert_eq!(
            evaluate(&stored, FIVE_MINUTES, at(1_000_000 + 300_001)),
            Freshness::Expired
        );
    }

    #[test]
    fn unstamped_entry_is_expired() {
        assert_eq!(evaluate(&entry(), FIVE_MINUTES, at(0)), Freshness::Expired);
    }
}
