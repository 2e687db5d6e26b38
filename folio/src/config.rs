//! Proxy configuration.
//!
//! [`ProxyConfig`] describes one deployment of the reader: its own origin, the
//! partition version suffix, the trusted cross-origin hosts and the path lists
//! that drive classification. It is usually loaded from YAML:
//!
//! ```yaml
//! origin: https://reader.example/
//! version: v7
//! hosts:
//!   github: [raw.githubusercontent.com]
//!   weserv: [images.weserv.nl, wsrv.nl]
//!   r2: ["*.r2.dev"]
//! short_ttl:
//!   paths: [manga.json, daily-views.json]
//!   max_age: 5m
//! ```
//!
//! Every field except `origin` has a default matching the reference deployment.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while loading or validating a [`ProxyConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML document could not be parsed into a configuration.
    #[error("invalid configuration document: {0}")]
    Yaml(String),
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// A value parsed but is not usable.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
}

/// Hostname matcher: an exact name or a `*.suffix` wildcard.
///
/// ```
/// use folio::config::HostPattern;
///
/// let pattern: HostPattern = "*.r2.dev".parse().unwrap();
/// assert!(pattern.matches("pub-1234.r2.dev"));
/// assert!(!pattern.matches("r2.dev"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HostPattern {
    /// Matches one hostname, ignoring ASCII case.
    Exact(String),
    /// Matches any hostname ending with `.{suffix}`.
    Wildcard(String),
}

impl HostPattern {
    /// `true` if `host` is covered by this pattern.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Exact(name) => host.eq_ignore_ascii_case(name),
            HostPattern::Wildcard(suffix) => host
                .len()
                .checked_sub(suffix.len() + 1)
                .filter(|dot| *dot > 0)
                .is_some_and(|dot| {
                    host.as_bytes()[dot] == b'.'
                        && host
                            .get(dot + 1..)
                            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
                }),
        }
    }
}

impl FromStr for HostPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("*.") {
            Some(suffix) if !suffix.is_empty() && !suffix.contains('*') => {
                Ok(HostPattern::Wildcard(suffix.to_ascii_lowercase()))
            }
            None if !s.is_empty() && !s.contains('*') => {
                Ok(HostPattern::Exact(s.to_ascii_lowercase()))
            }
            _ => Err(ConfigError::Invalid(format!("bad host pattern {s:?}"))),
        }
    }
}

impl TryFrom<String> for HostPattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HostPattern> for String {
    fn from(pattern: HostPattern) -> Self {
        pattern.to_string()
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostPattern::Exact(name) => f.write_str(name),
            HostPattern::Wildcard(suffix) => write!(f, "*.{suffix}"),
        }
    }
}

/// Trusted cross-origin hosts, one list per policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustedHosts {
    /// Raw-content host serving catalogue JSON.
    pub github: Vec<HostPattern>,
    /// Image resizing CDN.
    pub weserv: Vec<HostPattern>,
    /// Token-authenticated object storage.
    pub r2: Vec<HostPattern>,
}

impl Default for TrustedHosts {
    fn default() -> Self {
        TrustedHosts {
            github: vec![HostPattern::Exact("raw.githubusercontent.com".into())],
            weserv: vec![
                HostPattern::Exact("images.weserv.nl".into()),
                HostPattern::Exact("wsrv.nl".into()),
            ],
            r2: vec![HostPattern::Wildcard("r2.dev".into())],
        }
    }
}

/// Raw-content resources served under a maximum age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortTtlConfig {
    /// Path fragments selecting the short-TTL subset.
    pub paths: Vec<String>,
    /// Maximum age of a cached copy (e.g. "5m", "300s").
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for ShortTtlConfig {
    fn default() -> Self {
        ShortTtlConfig {
            paths: vec!["manga.json".into(), "daily-views.json".into()],
            max_age: Duration::from_millis(300_000),
        }
    }
}

/// Key normalization for the token-authenticated object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct R2Config {
    /// Query parameters that authenticate but do not select content.
    pub volatile_params: Vec<String>,
}

impl Default for R2Config {
    fn default() -> Self {
        R2Config {
            volatile_params: vec!["token".into(), "expires".into()],
        }
    }
}

/// Configuration of one proxy deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// The app's own origin.
    pub origin: Url,
    /// Partition version suffix; bumping it supersedes every partition.
    #[serde(default = "default_version")]
    pub version: String,
    /// Trusted cross-origin hosts.
    #[serde(default)]
    pub hosts: TrustedHosts,
    /// Path or URL fragments that are never cached.
    #[serde(default = "default_never_cache")]
    pub never_cache: Vec<String>,
    /// Short-TTL subset of raw-content traffic.
    #[serde(default)]
    pub short_ttl: ShortTtlConfig,
    /// Directory of same-origin covers.
    #[serde(default = "default_covers_dir")]
    pub covers_dir: String,
    /// Static paths pre-populated at install.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,
    /// Single-page entry document used as the last offline fallback.
    #[serde(default = "default_app_shell")]
    pub app_shell: String,
    /// Object storage key normalization.
    #[serde(default)]
    pub r2: R2Config,
    /// Response header reporting HIT/MISS/STALE; `null` disables it.
    #[serde(default = "default_cache_status_header")]
    pub cache_status_header: Option<String>,
}

fn default_version() -> String {
    "v1".into()
}

fn default_never_cache() -> Vec<String> {
    vec!["manifest.json".into(), "version.txt".into()]
}

fn default_covers_dir() -> String {
    "/covers/".into()
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/styles.css",
        "/app.js",
        "/reader.js",
        "/favicon.ico",
        "/icons/icon-192.png",
        "/icons/icon-512.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_app_shell() -> String {
    "/index.html".into()
}

fn default_cache_status_header() -> Option<String> {
    Some("x-cache-status".into())
}

impl ProxyConfig {
    /// Configuration for `origin` with every other field at its default.
    pub fn new(origin: Url) -> Self {
        ProxyConfig {
            origin,
            version: default_version(),
            hosts: TrustedHosts::default(),
            never_cache: default_never_cache(),
            short_ttl: ShortTtlConfig::default(),
            covers_dir: default_covers_dir(),
            static_assets: default_static_assets(),
            app_shell: default_app_shell(),
            r2: R2Config::default(),
            cache_status_header: default_cache_status_header(),
        }
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ProxyConfig =
            serde_saphyr::from_str(yaml).map_err(|err| ConfigError::Yaml(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Checks the values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.origin.scheme(), "http" | "https") || self.origin.host().is_none() {
            return Err(ConfigError::Invalid(format!(
                "origin {} must be an absolute http(s) URL",
                self.origin
            )));
        }
        if self.version.is_empty() || self.version.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "version {:?} must be a non-empty token",
                self.version
            )));
        }
        let paths = std::iter::once(&self.covers_dir)
            .chain(std::iter::once(&self.app_shell))
            .chain(self.static_assets.iter());
        for path in paths {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "path {path:?} must start with '/'"
                )));
            }
        }
        if self.short_ttl.max_age.is_zero() {
            return Err(ConfigError::Invalid("short_ttl.max_age must be positive".into()));
        }
        if let Some(header) = &self.cache_status_header {
            http::HeaderName::from_bytes(header.as_bytes())
                .map_err(|_| ConfigError::Invalid(format!("bad header name {header:?}")))?;
        }
        Ok(())
    }

    /// Absolute URL of an app-relative path.
    pub fn resolve(&self, path: &str) -> Result<Url, ConfigError> {
        self.origin
            .join(path)
            .map_err(|err| ConfigError::Invalid(format!("cannot resolve {path:?}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_fills_defaults() {
        let config = ProxyConfig::from_yaml("origin: https://reader.example/\n").unwrap();

        assert_eq!(config.version, "v1");
        assert_eq!(config.never_cache, vec!["manifest.json", "version.txt"]);
        assert_eq!(config.short_ttl.max_age, Duration::from_millis(300_000));
        assert_eq!(config.r2.volatile_params, vec!["token", "expires"]);
        assert_eq!(config.app_shell, "/index.html");
        assert_eq!(config, ProxyConfig::new(config.origin.clone()));
    }

    #[test]
    fn yaml_overrides_hosts_and_durations() {
        let yaml = r#"
origin: https://reader.example/
version: v7
hosts:
  github: [raw.githubusercontent.com]
  r2: ["*.cdn.reader.example"]
short_ttl:
  paths: [manga.json]
  max_age: 90s
cache_status_header: null
"#;
        let config = ProxyConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.version, "v7");
        assert_eq!(config.short_ttl.max_age, Duration::from_secs(90));
        assert!(config.hosts.r2[0].matches("files.cdn.reader.example"));
        assert_eq!(config.hosts.weserv, TrustedHosts::default().weserv);
        assert_eq!(config.cache_status_header, None);
    }

    #[test]
    fn relative_static_path_is_rejected() {
        let yaml = "origin: https://reader.example/\nstatic_assets: [index.html]\n";
        assert!(matches!(
            ProxyConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_origin_is_a_parse_error() {
        assert!(matches!(
            ProxyConfig::from_yaml("version: v2\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn host_patterns() {
        let exact: HostPattern = "Images.Weserv.nl".parse().unwrap();
        assert!(exact.matches("images.weserv.nl"));
        assert!(!exact.matches("evil-images.weserv.nl"));

        let wildcard: HostPattern = "*.r2.dev".parse().unwrap();
        assert!(wildcard.matches("pub-abc.r2.dev"));
        assert!(!wildcard.matches("pub-abcr2.dev"));
        assert_eq!(wildcard.to_string(), "*.r2.dev");

        assert!("*".parse::<HostPattern>().is_err());
        assert!("".parse::<HostPattern>().is_err());
    }
}
