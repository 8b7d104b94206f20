//! HTTP transport seam.
//!
//! [`RequestClient`](crate::network::RequestClient) talks to the service
//! through the [`Transport`] trait so exchanges can be faked in tests.
//! [`HttpTransport`] is the real implementation on top of `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FsError;

/// Request content type.
pub const REQUEST_MIME: &str = "application/x-findsurface-request";
/// Expected response content type.
pub const RESPONSE_MIME: &str = "application/x-findsurface-response";

/// Announces a big-endian request body.
pub const CONTENT_ENDIAN_HEADER: &str = "X-Content-Endian";
/// Asks for a big-endian response body.
pub const ACCEPT_ENDIAN_HEADER: &str = "X-Accept-Endian";

/// One outgoing POST.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

/// What came back from the service, before protocol validation.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Option<Bytes>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one POST exchange. Resolves once the full body is read.
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, FsError>;
}

// ── HttpTransport ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, FsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, FsError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(reqwest::header::CONTENT_TYPE, REQUEST_MIME)
            .body(request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            content_type,
            body: (!body.is_empty()).then_some(body),
        })
    }
}
