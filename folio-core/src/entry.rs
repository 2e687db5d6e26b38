//! Stored cache entries.
//!
//! A [`CacheEntry`] is the persisted form of a network response. Once stored it
//! is never mutated in place; a newer fetch replaces it wholesale under the same
//! [`CacheKey`](crate::CacheKey).
//!
//! Entries of time-checked classes carry an injected [`FETCHED_AT_HEADER`]
//! recording when the network response was received, in milliseconds since the
//! Unix epoch. Entries without it have no provenance and are treated as expired
//! by freshness checks.

use std::mem::size_of;

use chrono::{DateTime, TimeZone, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{CacheStatus, ProxyResponse, Raw};

/// Header injected into time-checked entries, holding the fetch time in epoch millis.
pub const FETCHED_AT_HEADER: &str = "sw-fetched-on";

/// A cached response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    status: u16,
    status_text: SmolStr,
    headers: Vec<(SmolStr, String)>,
    body: Raw,
}

impl CacheEntry {
    /// Snapshot of a network response, headers copied verbatim.
    pub fn from_response(response: &ProxyResponse) -> Self {
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    SmolStr::new(name.as_str()),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        CacheEntry {
            status: response.status().as_u16(),
            status_text: SmolStr::new(response.status_text()),
            headers,
            body: response.body().clone(),
        }
    }

    /// Returns a copy of this entry stamped with the given fetch time.
    ///
    /// Any previous stamp is replaced.
    pub fn stamped(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(FETCHED_AT_HEADER));
        self.headers.push((
            SmolStr::new_static(FETCHED_AT_HEADER),
            fetched_at.timestamp_millis().to_string(),
        ));
        self
    }

    /// Status code as stored.
    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status text as stored.
    #[inline]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Stored body bytes.
    #[inline]
    pub fn body(&self) -> &Raw {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Fetch time recorded in [`FETCHED_AT_HEADER`], if present and well-formed.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let millis = self.header(FETCHED_AT_HEADER)?.trim().parse::<i64>().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Rebuilds a client-facing response from this entry.
    ///
    /// Headers that are no longer valid HTTP header values are dropped.
    pub fn to_response(&self, cache_status: CacheStatus) -> ProxyResponse {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let headers = self
            .headers
            .iter()
            .filter_map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes()).ok()?;
                let value = HeaderValue::from_str(value).ok()?;
                Some((name, value))
            })
            .collect::<HeaderMap>();
        ProxyResponse::new(status, self.body.clone())
            .with_status_text(self.status_text.clone())
            .with_headers(headers)
            .with_cache_status(cache_status)
    }

    /// Estimated memory usage of this entry in bytes.
    pub fn memory_size(&self) -> usize {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| name.len() + value.len())
            .sum::<usize>();
        size_of::<Self>() + headers + self.body.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header;

    fn response() -> ProxyResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/webp"));
        ProxyResponse::new(StatusCode::OK, "cover-bytes").with_headers(headers)
    }

    #[test]
    fn snapshot_preserves_status_headers_and_body() {
        let entry = CacheEntry::from_response(&response());
        assert_eq!(entry.status(), 200);
        assert_eq!(entry.status_text(), "OK");
        assert_eq!(entry.header("Content-Type"), Some("image/webp"));
        assert_eq!(entry.body().as_ref(), b"cover-bytes");
        assert_eq!(entry.fetched_at(), None);
    }

    #[test]
    fn stamping_replaces_previous_timestamp() {
        let first = Utc.timestamp_millis_opt(1_000).unwrap();
        let second = Utc.timestamp_millis_opt(2_000).unwrap();
        let entry = CacheEntry::from_response(&response())
            .stamped(first)
            .stamped(second);

        assert_eq!(entry.fetched_at(), Some(second));
        assert_eq!(
            entry
                .headers
                .iter()
                .filter(|(name, _)| name == FETCHED_AT_HEADER)
                .count(),
            1
        );
    }

    #[test]
    fn malformed_timestamp_reads_as_missing() {
        let mut entry = CacheEntry::from_response(&response());
        entry
            .headers
            .push((SmolStr::new_static(FETCHED_AT_HEADER), "yesterday".into()));
        assert_eq!(entry.fetched_at(), None);
    }

    #[test]
    fn rebuilt_response_carries_cache_status() {
        let entry = CacheEntry::from_response(&response());
        let rebuilt = entry.to_response(CacheStatus::Hit);
        assert_eq!(rebuilt.status(), StatusCode::OK);
        assert_eq!(rebuilt.cache_status(), CacheStatus::Hit);
        assert_eq!(
            rebuilt.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/webp"
        );
    }
}
