//! Routing class tags.
//!
//! Every intercepted request is tagged with exactly one [`RoutingClass`]. The tag
//! is derived from the request URL alone and computed fresh for each request;
//! it selects the caching policy applied to that request.

use std::fmt;

/// Trusted cross-origin hosts, each mapped to its own policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustedHost {
    /// Raw-content host serving catalogue JSON.
    Github,
    /// Image resizing CDN; the query selects the rendition.
    Weserv,
    /// Token-authenticated object storage; `token`/`expires` rotate per navigation.
    R2,
}

impl TrustedHost {
    /// Returns the host kind as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TrustedHost::Github => "github",
            TrustedHost::Weserv => "weserv",
            TrustedHost::R2 => "r2",
        }
    }
}

/// Handling class of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingClass {
    /// Security-sensitive or version-probe endpoints; never read from or written to the cache.
    NeverCache,
    /// Raw-content resources checked against a maximum age.
    ShortTtl,
    /// Cross-origin request to a trusted host.
    CrossOriginTrusted(TrustedHost),
    /// Same-origin manga covers.
    LocalImage,
    /// Same-origin documents, scripts, styles and icons pre-populated at install.
    StaticAsset,
    /// Everything else on the app's own origin.
    Dynamic,
}

impl RoutingClass {
    /// Stable label for logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoutingClass::NeverCache => "never_cache",
            RoutingClass::ShortTtl => "short_ttl",
            RoutingClass::CrossOriginTrusted(host) => match host {
                TrustedHost::Github => "github",
                TrustedHost::Weserv => "weserv",
                TrustedHost::R2 => "r2",
            },
            RoutingClass::LocalImage => "local_image",
            RoutingClass::StaticAsset => "static_asset",
            RoutingClass::Dynamic => "dynamic",
        }
    }

    /// `true` for classes served from another origin.
    pub const fn is_cross_origin(&self) -> bool {
        matches!(
            self,
            RoutingClass::ShortTtl | RoutingClass::CrossOriginTrusted(_)
        )
    }
}

impl fmt::Display for RoutingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
