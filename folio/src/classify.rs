//! Routing classification.
//!
//! [`Classifier::classify`] is a pure function of the request URL. Rules are
//! applied in priority order:
//!
//! 1. never-cache fragments in the path or full URL, on any origin
//! 2. cross-origin: raw-content host (never-cache checked again, then the
//!    short-TTL subset), resizing CDN, object storage, otherwise no policy
//! 3. same-origin covers directory
//! 4. enumerated static asset paths
//! 5. everything else is dynamic content

use std::collections::HashSet;
use std::sync::Arc;

use folio_core::{ProxyRequest, RoutingClass, TrustedHost};
use url::{Origin, Url};

use crate::config::{HostPattern, ProxyConfig};

/// Maps requests to their [`RoutingClass`].
#[derive(Debug, Clone)]
pub struct Classifier {
    config: Arc<ProxyConfig>,
    origin: Origin,
    static_paths: HashSet<String>,
}

impl Classifier {
    /// Builds a classifier for one deployment.
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        let origin = config.origin.origin();
        let static_paths = config.static_assets.iter().cloned().collect();
        Classifier {
            config,
            origin,
            static_paths,
        }
    }

    /// Classifies a request.
    ///
    /// Returns `None` for cross-origin requests to hosts without a policy:
    /// those pass through unintercepted.
    pub fn classify(&self, request: &ProxyRequest) -> Option<RoutingClass> {
        self.classify_url(request.url())
    }

    /// Classifies a bare URL.
    pub fn classify_url(&self, url: &Url) -> Option<RoutingClass> {
        if self.is_never_cache(url) {
            return Some(RoutingClass::NeverCache);
        }

        if url.origin() != self.origin {
            let host = url.host_str()?;
            let hosts = &self.config.hosts;
            return if matches_any(&hosts.github, host) {
                Some(self.classify_raw_content(url))
            } else if matches_any(&hosts.weserv, host) {
                Some(RoutingClass::CrossOriginTrusted(TrustedHost::Weserv))
            } else if matches_any(&hosts.r2, host) {
                Some(RoutingClass::CrossOriginTrusted(TrustedHost::R2))
            } else {
                None
            };
        }

        let path = url.path();
        if path.starts_with(&self.config.covers_dir) {
            Some(RoutingClass::LocalImage)
        } else if self.static_paths.contains(path) {
            Some(RoutingClass::StaticAsset)
        } else {
            Some(RoutingClass::Dynamic)
        }
    }

    fn classify_raw_content(&self, url: &Url) -> RoutingClass {
        // Repeated for hosts whose never-cache resources live under another name.
        if self.is_never_cache(url) {
            return RoutingClass::NeverCache;
        }
        let path = url.path();
        if self
            .config
            .short_ttl
            .paths
            .iter()
            .any(|fragment| path.contains(fragment.as_str()))
        {
            RoutingClass::ShortTtl
        } else {
            RoutingClass::CrossOriginTrusted(TrustedHost::Github)
        }
    }

    fn is_never_cache(&self, url: &Url) -> bool {
        let path = url.path();
        let full = url.as_str();
        self.config
            .never_cache
            .iter()
            .any(|fragment| path.contains(fragment.as_str()) || full.contains(fragment.as_str()))
    }
}

fn matches_any(patterns: &[HostPattern], host: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(host))
}
