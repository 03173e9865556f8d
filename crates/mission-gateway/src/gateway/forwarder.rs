//! Transparent HTTP forwarding to the upstream backend.
//!
//! Each forward opens a fresh connection, mirrors the inbound request
//! (method, path and query, headers, streamed body), and relays the
//! upstream's status, headers, and body stream back untouched. Failures to
//! reach the upstream surface as 502 and are never retried.

use super::{full_body, ProxyBody};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Relays non-upgrade requests to the upstream.
pub struct HttpForwarder {
    upstream_addr: String,
}

impl HttpForwarder {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            upstream_addr: config.upstream_addr(),
        }
    }

    /// Forward a request and relay the response.
    ///
    /// The inbound body is handed to the outbound request as-is, so it
    /// streams through without ever being buffered whole; the upstream's
    /// response body streams back the same way. Bodies are opaque byte
    /// streams to the gateway.
    ///
    /// Connect or protocol failures before a response is obtained surface
    /// as [`GatewayError::Upstream`]; the caller answers with a 502.
    pub async fn forward(&self, req: Request<Incoming>) -> GatewayResult<Response<ProxyBody>> {
        let mut sender = connect_upstream(&self.upstream_addr).await?;

        let outbound = mirror_request(req)?;
        let response = sender
            .send_request(outbound)
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        debug!(status = %response.status(), "upstream responded");
        Ok(response.map(BodyExt::boxed))
    }
}

/// Open a fresh HTTP/1.1 connection to the upstream and spawn its driver.
///
/// The connection task ends when the request/response exchange completes or
/// when the caller drops the sender (e.g. the original client disconnected),
/// which closes the upstream socket promptly.
async fn connect_upstream(
    addr: &str,
) -> GatewayResult<hyper::client::conn::http1::SendRequest<Incoming>> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| GatewayError::Upstream(format!("connect {addr}: {e}")))?;

    let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| GatewayError::Upstream(format!("handshake {addr}: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "upstream connection ended");
        }
    });

    Ok(sender)
}

/// Build the outbound request: same method, same path and query, same
/// headers, body streamed through.
fn mirror_request(req: Request<Incoming>) -> GatewayResult<Request<Incoming>> {
    let (parts, body) = req.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/")
        .to_string();

    let mut outbound = Request::builder()
        .method(parts.method)
        .uri(path_and_query)
        .body(body)?;
    *outbound.headers_mut() = parts.headers;

    Ok(outbound)
}

/// 502 response for an unreachable upstream.
pub(crate) fn bad_gateway_response(error: &GatewayError) -> Response<ProxyBody> {
    warn!(error = %error, "upstream unavailable");
    let mut resp = Response::new(full_body("Upstream unavailable\n"));
    *resp.status_mut() = StatusCode::BAD_GATEWAY;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    resp
}
