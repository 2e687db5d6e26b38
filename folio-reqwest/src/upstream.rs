//! `Upstream` implementation over a reqwest client.

use async_trait::async_trait;
use folio_core::{Credentials, ProxyRequest, ProxyResponse, RequestMode, Upstream, UpstreamError};
use http::{HeaderMap, HeaderValue, header};
use tracing::{debug, trace};
use url::Url;

/// Headers never sent when credentials are omitted.
const CREDENTIAL_HEADERS: [header::HeaderName; 3] = [
    header::COOKIE,
    header::AUTHORIZATION,
    header::PROXY_AUTHORIZATION,
];

/// Network transport backed by [`reqwest::Client`].
///
/// Cheap to clone: the underlying client is reference counted.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: reqwest::Client,
    origin: Option<HeaderValue>,
}

impl ReqwestUpstream {
    /// Wraps a configured client.
    pub fn new(client: reqwest::Client) -> Self {
        ReqwestUpstream {
            client,
            origin: None,
        }
    }

    /// Sends `Origin: <app origin>` on cross-origin requests.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = HeaderValue::from_str(&origin.origin().ascii_serialization()).ok();
        self
    }

    fn outgoing_headers(&self, request: &ProxyRequest) -> HeaderMap {
        let mut headers = request.headers().clone();
        if request.credentials() == Credentials::Omit {
            for name in CREDENTIAL_HEADERS {
                headers.remove(name);
            }
        }
        if request.mode() == RequestMode::Cors
            && let Some(origin) = &self.origin
        {
            headers.insert(header::ORIGIN, origin.clone());
        }
        headers
    }
}

#[async_trait]
impl Upstream for ReqwestUpstream {
    async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        let headers = self.outgoing_headers(&request);
        trace!(method = %request.method(), url = %request.url(), "sending request");

        let response = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(headers)
            .send()
            .await
            .map_err(into_upstream_error)?;

        let status = response.status();
        let response_headers = response.headers().clone();
        let body = response.bytes().await.map_err(into_upstream_error)?;
        debug!(url = %request.url(), %status, bytes = body.len(), "response received");

        Ok(ProxyResponse::new(status, body).with_headers(response_headers))
    }
}

fn into_upstream_error(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else if err.is_builder() {
        UpstreamError::InvalidRequest(err.to_string())
    } else {
        UpstreamError::Network(Box::new(err))
    }
}
