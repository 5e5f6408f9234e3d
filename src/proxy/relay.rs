//! Upstream fetch and response relay
//!
//! The JSON variant buffers the (small) player API body so it can be
//! validated; the XMLTV variant never holds more than one chunk in memory and
//! hands the upstream byte stream straight to the response body.
//!
//! The configured timeout bounds the wait for response headers. JSON bodies
//! must also arrive within it; a streamed body may take as long as it needs
//! but is abandoned once the upstream goes silent for a whole timeout.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{stream::BoxStream, Stream, StreamExt};
use std::time::Duration;
use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, warn};

use super::translator::UpstreamRequest;
use crate::errors::{ProxyError, ProxyResult};

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Open upstream body: status plus a lazily pulled byte stream
pub struct UpstreamStream {
    pub status: StatusCode,
    pub body: BoxStream<'static, Result<Bytes, ProxyError>>,
}

/// Shared HTTP client for upstream calls
///
/// One instance is built at startup so connections to the same upstream are
/// pooled. Requests are never retried.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }

    /// Send the request and insist on a success status
    ///
    /// Only the wait for the response headers is bounded here.
    async fn send(&self, request: &UpstreamRequest) -> ProxyResult<reqwest::Response> {
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        let response = match timeout(request.timeout, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let reason = if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                warn!(
                    upstream = %request.host_for_logging(),
                    endpoint = request.endpoint.path(),
                    "Upstream {}: {}",
                    reason,
                    e.without_url()
                );
                return Err(ProxyError::upstream_unavailable(reason));
            }
            Err(_) => {
                warn!(
                    upstream = %request.host_for_logging(),
                    endpoint = request.endpoint.path(),
                    timeout = ?request.timeout,
                    "Upstream did not respond in time"
                );
                return Err(ProxyError::upstream_unavailable(format!(
                    "timed out after {:?}",
                    request.timeout
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                upstream = %request.host_for_logging(),
                endpoint = request.endpoint.path(),
                status = status.as_u16(),
                "Upstream returned non-success status"
            );
            return Err(ProxyError::upstream_unavailable(format!(
                "upstream status {}",
                status.as_u16()
            )));
        }

        Ok(response)
    }

    /// Fetch a player API response and parse it as JSON
    pub async fn fetch_json(&self, request: &UpstreamRequest) -> ProxyResult<serde_json::Value> {
        let deadline = Instant::now() + request.timeout;
        let response = self.send(request).await?;

        let body = match timeout_at(deadline, response.bytes()).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                warn!(
                    upstream = %request.host_for_logging(),
                    "Failed reading upstream body: {}",
                    e.without_url()
                );
                return Err(ProxyError::upstream_unavailable("failed reading upstream body"));
            }
            Err(_) => {
                warn!(
                    upstream = %request.host_for_logging(),
                    timeout = ?request.timeout,
                    "Upstream body did not arrive in time"
                );
                return Err(ProxyError::upstream_unavailable("timed out reading upstream body"));
            }
        };

        serde_json::from_slice(&body).map_err(|e| {
            warn!(
                upstream = %request.host_for_logging(),
                body_len = body.len(),
                "Upstream returned unparseable JSON: {}",
                e
            );
            ProxyError::malformed(e.to_string())
        })
    }

    /// Open a streaming upstream response
    ///
    /// The body has no overall deadline. A stall longer than the request
    /// timeout, or a transport error, surfaces as a stream error, which aborts
    /// the downstream connection.
    pub async fn open_stream(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamStream> {
        let response = self.send(request).await?;
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::OK);

        debug!(
            upstream = %request.host_for_logging(),
            status = status.as_u16(),
            content_length = ?response.content_length(),
            "Upstream stream opened"
        );

        let body = with_idle_timeout(
            response.bytes_stream(),
            request.timeout,
            request.host_for_logging(),
        );

        Ok(UpstreamStream { status, body })
    }
}

/// Yield chunks until the upstream ends, fails, or stays silent for `idle`
fn with_idle_timeout<S>(
    stream: S,
    idle: Duration,
    upstream: String,
) -> BoxStream<'static, Result<Bytes, ProxyError>>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    futures::stream::unfold(Some(stream.boxed()), move |state| {
        let upstream = upstream.clone();
        async move {
            let mut inner = state?;
            match timeout(idle, inner.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(inner))),
                Ok(None) => None,
                Ok(Some(Err(e))) => {
                    warn!(
                        upstream = %upstream,
                        "Upstream stream failed mid-transfer: {}",
                        e.without_url()
                    );
                    Some((
                        Err(ProxyError::upstream_unavailable("upstream stream failed")),
                        None,
                    ))
                }
                Err(_) => {
                    warn!(
                        upstream = %upstream,
                        idle = ?idle,
                        "Upstream stream stalled mid-transfer"
                    );
                    Some((
                        Err(ProxyError::upstream_unavailable("upstream stream stalled")),
                        None,
                    ))
                }
            }
        }
    })
    .boxed()
}

/// Relay a parsed player API payload unchanged
pub fn json_response(payload: serde_json::Value) -> Response {
    Json(payload).into_response()
}

/// Relay an XMLTV stream with the fixed XML headers
pub fn xml_stream_response(upstream: UpstreamStream) -> Response {
    let mut response = Response::new(Body::from_stream(upstream.body));
    *response.status_mut() = upstream.status;

    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    response
}
