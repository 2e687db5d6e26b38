//! Intercepted outgoing requests.

use http::{HeaderMap, HeaderValue, Method, header::HeaderName};
use url::Url;

/// Cross-origin mode requested for the network fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Same-origin request, the default for app-local traffic.
    #[default]
    SameOrigin,
    /// Cross-origin request allowed (CORS).
    Cors,
}

/// Whether credentials (cookies, authorization) travel with the fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Send credentials only to the app's own origin.
    #[default]
    SameOrigin,
    /// Never send credentials.
    Omit,
}

/// An outgoing request made by the web client.
///
/// Only the parts the proxy looks at are modelled: method, absolute URL and
/// headers. Request bodies are never cached, so they are not carried here.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    mode: RequestMode,
    credentials: Credentials,
}

impl ProxyRequest {
    /// Creates a request with no headers.
    pub fn new(method: Method, url: Url) -> Self {
        ProxyRequest {
            method,
            url,
            headers: HeaderMap::new(),
            mode: RequestMode::default(),
            credentials: Credentials::default(),
        }
    }

    /// Shortcut for a `GET` request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Adds a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the cross-origin mode and credentials policy used by the transport.
    pub fn with_mode(mut self, mode: RequestMode, credentials: Credentials) -> Self {
        self.mode = mode;
        self.credentials = credentials;
        self
    }

    /// Request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute request URL.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Cross-origin mode.
    #[inline]
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Credentials policy.
    #[inline]
    pub fn credentials(&self) -> Credentials {
        self.credentials
    }
}
