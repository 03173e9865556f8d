//! WebSocket (protocol upgrade) tunneling.
//!
//! Lifecycle: Pending (handshake replayed to the upstream) → Established
//! (both legs switched protocols, raw bytes spliced in both directions) →
//! Closed (either leg reaching end-of-stream tears the other down).
//! Failed is terminal from Pending: the upstream refused the upgrade or
//! could not be reached, and the client socket is released cleanly.
//!
//! The splice is two independent copy directions joined by `select!`-style
//! cancellation, not a single polling loop, so an idle direction never
//! stalls the other. No framing awareness, no data inspection: any bytes
//! the upstream pipelines right after its `101` are relayed verbatim by
//! hyper's upgrade buffers.

use super::{empty_body, ProxyBody};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Establishes and splices protocol-upgrade tunnels to the upstream.
pub struct WebSocketTunnel {
    upstream_addr: String,
}

impl WebSocketTunnel {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            upstream_addr: config.upstream_addr(),
        }
    }

    /// Handle an inbound upgrade request.
    ///
    /// Replays the upgrade handshake (method, path, headers) over a fresh
    /// upstream connection. On a `101` the upstream's status line and
    /// headers are echoed back to the client and a splice task takes over
    /// both sockets. A non-`101` answer is relayed as a normal response,
    /// which releases the client instead of leaving it hanging.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Upstream`] when the upstream cannot be
    /// reached or the handshake fails before a response; the caller answers
    /// with 502 and closes the connection.
    pub async fn establish(
        &self,
        mut req: Request<Incoming>,
    ) -> GatewayResult<Response<ProxyBody>> {
        // Take the client-side upgrade future before the request is
        // consumed for the outbound handshake.
        let client_upgrade = hyper::upgrade::on(&mut req);

        let stream = TcpStream::connect(&self.upstream_addr)
            .await
            .map_err(|e| GatewayError::Upstream(format!("connect {}: {e}", self.upstream_addr)))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| GatewayError::Upstream(format!("handshake {}: {e}", self.upstream_addr)))?;

        // The driver must keep polling after the exchange so the upgrade
        // can complete on the upstream leg.
        tokio::spawn(async move {
            if let Err(e) = conn.with_upgrades().await {
                debug!(error = %e, "upstream tunnel connection ended");
            }
        });

        let outbound = replay_handshake(&req)?;
        let mut response = sender
            .send_request(outbound)
            .await
            .map_err(|e| GatewayError::Upstream(e.to_string()))?;

        if response.status() != StatusCode::SWITCHING_PROTOCOLS {
            // Failed: the upstream answered with a normal response. Relay it
            // so the client is released cleanly.
            debug!(status = %response.status(), "upstream refused upgrade");
            return Ok(response.map(BodyExt::boxed));
        }

        let upstream_upgrade = hyper::upgrade::on(&mut response);
        tokio::spawn(splice(client_upgrade, upstream_upgrade));

        // Echo the upstream's protocol-switch response back to the client;
        // hyper hands the connection to the splice task after writing it.
        let mut echo = Response::new(empty_body());
        *echo.status_mut() = response.status();
        *echo.headers_mut() = response.headers().clone();
        Ok(echo)
    }
}

/// Replay the inbound upgrade request toward the upstream: same method,
/// path and query, and headers, with an empty body.
fn replay_handshake(req: &Request<Incoming>) -> GatewayResult<Request<Empty<Bytes>>> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut outbound = Request::builder()
        .method(req.method().clone())
        .uri(path_and_query)
        .body(Empty::new())?;
    *outbound.headers_mut() = req.headers().clone();

    Ok(outbound)
}

/// Copy bytes in both directions until either side closes, then drop both
/// sockets.
///
/// `select!` completing on one direction cancels the other, so a half-open
/// tunnel never outlives one side's closure.
async fn splice(client_upgrade: OnUpgrade, upstream_upgrade: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client_upgrade, upstream_upgrade) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "tunnel upgrade failed");
            return;
        }
    };

    info!("tunnel established");

    let (mut client_read, mut client_write) = tokio::io::split(TokioIo::new(client));
    let (mut upstream_read, mut upstream_write) = tokio::io::split(TokioIo::new(upstream));

    tokio::select! {
        result = tokio::io::copy(&mut client_read, &mut upstream_write) => {
            debug!(bytes = ?result, "tunnel closed (client side ended)");
        }
        result = tokio::io::copy(&mut upstream_read, &mut client_write) => {
            debug!(bytes = ?result, "tunnel closed (upstream side ended)");
        }
    }
}
