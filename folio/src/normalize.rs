//! Cache key normalization.
//!
//! Most classes are keyed by the full request URL, query included. Object
//! storage URLs carry rotating credentials in their query, so those parameters
//! are dropped from the key.
//!
//! Keys are built from the URL alone. Request headers, `Cookie` and
//! `Authorization` included, never reach the store.

use folio_core::{CacheKey, ProxyRequest, RoutingClass, TrustedHost};
use url::Url;

use crate::config::R2Config;

/// Derives the key `request` is stored and looked up under.
///
/// Returns `None` for [`RoutingClass::NeverCache`], which is never stored.
pub fn normalize(request: &ProxyRequest, class: RoutingClass, r2: &R2Config) -> Option<CacheKey> {
    let url = without_fragment(request.url());
    match class {
        RoutingClass::NeverCache => None,
        RoutingClass::CrossOriginTrusted(TrustedHost::R2) => {
            Some(CacheKey::from(&strip_params(&url, &r2.volatile_params)))
        }
        _ => Some(CacheKey::from(&url)),
    }
}

/// Removes every query parameter named in `volatile`, keeping the order of the rest.
pub fn strip_params(url: &Url, volatile: &[String]) -> Url {
    let mut stripped = url.clone();
    if url.query().is_none() {
        return stripped;
    }
    let kept = url
        .query_pairs()
        .filter(|(name, _)| !volatile.iter().any(|param| param == name.as_ref()))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, header};

    fn request(url: &str) -> ProxyRequest {
        ProxyRequest::get(Url::parse(url).unwrap())
    }

    fn r2_key(request: &ProxyRequest) -> CacheKey {
        normalize(
            request,
            RoutingClass::CrossOriginTrusted(TrustedHost::R2),
            &R2Config::default(),
        )
        .unwrap()
    }

    #[test]
    fn rotating_credentials_share_one_key() {
        let first = r2_key(&request(
            "https://pub-1.r2.dev/covers/a.webp?token=abc&expires=100",
        ));
        let second = r2_key(&request(
            "https://pub-1.r2.dev/covers/a.webp?expires=200&token=xyz",
        ));
        assert_eq!(first, second);
        assert_eq!(first.as_str(), "https://pub-1.r2.dev/covers/a.webp");
    }

    #[test]
    fn other_params_survive_in_order() {
        let key = r2_key(&request(
            "https://pub-1.r2.dev/a.webp?w=300&token=t&fmt=avif&expires=9",
        ));
        assert_eq!(key.as_str(), "https://pub-1.r2.dev/a.webp?w=300&fmt=avif");
    }

    #[test]
    fn request_headers_do_not_change_the_key() {
        let bare = request("https://pub-1.r2.dev/a.webp?token=t");
        let with_headers = request("https://pub-1.r2.dev/a.webp?token=u")
            .with_header(header::COOKIE, HeaderValue::from_static("session=1"))
            .with_header(header::ACCEPT, HeaderValue::from_static("image/webp"));
        assert_eq!(r2_key(&bare), r2_key(&with_headers));
    }

    #[test]
    fn identity_keeps_query_but_drops_fragment() {
        let key = normalize(
            &request("https://images.weserv.nl/?url=a.jpg&w=300#top"),
            RoutingClass::CrossOriginTrusted(TrustedHost::Weserv),
            &R2Config::default(),
        )
        .unwrap();
        assert_eq!(key.as_str(), "https://images.weserv.nl/?url=a.jpg&w=300");
    }

    #[test]
    fn identity_keeps_token_named_params_outside_object_storage() {
        let key = normalize(
            &request("https://reader.example/read/1?token=abc"),
            RoutingClass::Dynamic,
            &R2Config::default(),
        )
        .unwrap();
        assert_eq!(key.as_str(), "https://reader.example/read/1?token=abc");
    }

    #[test]
    fn never_cache_has_no_key() {
        assert!(
            normalize(
                &request("https://reader.example/version.txt"),
                RoutingClass::NeverCache,
                &R2Config::default(),
            )
            .is_none()
        );
    }
}
