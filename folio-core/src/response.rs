//! Responses produced by the proxy.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, StatusCode, header};
use smol_str::SmolStr;

use crate::{CacheStatus, Raw};

/// A response handed back to the web client.
///
/// Carries everything the client observes (status, status text, headers, body)
/// plus the [`CacheStatus`] describing where it came from.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    status: StatusCode,
    status_text: SmolStr,
    headers: HeaderMap,
    body: Raw,
    cache_status: CacheStatus,
}

impl ProxyResponse {
    /// Creates a response with the canonical status text for `status`.
    pub fn new(status: StatusCode, body: impl Into<Raw>) -> Self {
        ProxyResponse {
            status,
            status_text: SmolStr::new(status.canonical_reason().unwrap_or_default()),
            headers: HeaderMap::new(),
            body: body.into(),
            cache_status: CacheStatus::Miss,
        }
    }

    /// Synthetic plain-text response used when neither cache nor network can answer.
    ///
    /// The body is the canonical reason phrase, e.g. `Service Unavailable`.
    pub fn placeholder(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Offline");
        let mut response = Self::new(status, Bytes::from_static(reason.as_bytes()));
        response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }

    /// Replaces the status text.
    pub fn with_status_text(mut self, text: impl Into<SmolStr>) -> Self {
        self.status_text = text.into();
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the cache status.
    pub fn with_cache_status(mut self, status: CacheStatus) -> Self {
        self.cache_status = status;
        self
    }

    /// Response status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response status text.
    #[inline]
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Response body.
    #[inline]
    pub fn body(&self) -> &Raw {
        &self.body
    }

    /// Where the response came from.
    #[inline]
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    /// `true` for 2xx responses, the only ones the proxy ever stores.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// What the proxy decided to do with an intercepted request.
#[derive(Debug)]
pub enum Outcome {
    /// The proxy answers the request with this response.
    Respond(ProxyResponse),
    /// The proxy declines to intervene; the request goes to the network untouched.
    PassThrough,
}

impl Outcome {
    /// Returns the response if the proxy answered.
    pub fn response(&self) -> Option<&ProxyResponse> {
        match self {
            Outcome::Respond(response) => Some(response),
            Outcome::PassThrough => None,
        }
    }

    /// Consumes the outcome, returning the response if the proxy answered.
    pub fn into_response(self) -> Option<ProxyResponse> {
        match self {
            Outcome::Respond(response) => Some(response),
            Outcome::PassThrough => None,
        }
    }

    /// `true` when the proxy declined to intervene.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Outcome::PassThrough)
    }
}
