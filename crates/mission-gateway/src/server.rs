//! Core server: accepts connections and dispatches requests to the gateway
//! components.
//!
//! One task per inbound TCP connection; request handling touches nothing
//! shared beyond the read-only configuration, so there is no locking across
//! requests. Per-request failures terminate that request only; the accept
//! loop keeps running.

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::auth::AuthDecision;
use crate::gateway::forwarder::bad_gateway_response;
use crate::gateway::router::RouteDecision;
use crate::gateway::{
    router, AuthGate, HttpForwarder, ProxyBody, StaticAssetResolver, WebSocketTunnel,
};
use hyper::body::Incoming;
use hyper::header::{self, HeaderValue};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// The gateway server instance.
pub struct GatewayServer {
    listener: TcpListener,
    inner: Arc<Inner>,
}

/// Shared request-handling state: the immutable configuration and the
/// components built from it.
struct Inner {
    config: GatewayConfig,
    assets: StaticAssetResolver,
    auth: AuthGate,
    forwarder: HttpForwarder,
    tunnel: WebSocketTunnel,
}

impl GatewayServer {
    /// Bind the listening socket and assemble the components.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the port cannot be bound.
    pub async fn bind(config: GatewayConfig) -> GatewayResult<Self> {
        let addr: SocketAddr = ([0, 0, 0, 0], config.listen_port).into();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Config(format!("cannot bind {addr}: {e}")))?;

        let inner = Arc::new(Inner {
            assets: StaticAssetResolver::new(&config),
            auth: AuthGate::new(&config),
            forwarder: HttpForwarder::new(&config),
            tunnel: WebSocketTunnel::new(&config),
            config,
        });

        Ok(Self { listener, inner })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process is shut down.
    pub async fn run(self) -> GatewayResult<()> {
        info!(
            port = self.local_addr()?.port(),
            upstream = %self.inner.config.upstream_addr(),
            bundle = %self.inner.config.bundle_dir.display(),
            auth = self.inner.auth.enabled(),
            "mission gateway ready"
        );

        loop {
            let (stream, remote_addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            };

            let inner = self.inner.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let inner = inner.clone();
                    async move { Ok::<_, Infallible>(inner.handle(req, remote_addr).await) }
                });

                let conn = hyper::server::conn::http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .with_upgrades();

                if let Err(e) = conn.await {
                    debug!(remote = %remote_addr, error = %e, "connection ended");
                }
            });
        }
    }
}

impl Inner {
    /// Dispatch a single request.
    ///
    /// Upgrade requests bypass path routing entirely: the bundle is static
    /// content and can never service a socket, so they always tunnel.
    async fn handle(&self, req: Request<Incoming>, remote: SocketAddr) -> Response<ProxyBody> {
        let path = req.uri().path().to_string();

        if router::is_upgrade_request(req.headers()) {
            debug!(remote = %remote, path = %path, "tunneling upgrade request");
            return match self.tunnel.establish(req).await {
                Ok(resp) => resp,
                Err(e) => {
                    // Pending → Failed: release the client socket cleanly.
                    let mut resp = bad_gateway_response(&e);
                    resp.headers_mut()
                        .insert(header::CONNECTION, HeaderValue::from_static("close"));
                    resp
                }
            };
        }

        match router::decide(&path, false) {
            RouteDecision::ServeBundle => {
                match self.auth.check(req.uri(), req.headers()) {
                    AuthDecision::Allow => {}
                    AuthDecision::IssueCookie => {
                        debug!(remote = %remote, "token accepted, issuing session cookie");
                        return self.auth.issue_cookie_response();
                    }
                    AuthDecision::Deny => {
                        debug!(remote = %remote, path = %path, "unauthorized dashboard request");
                        return self.auth.unauthorized_response();
                    }
                }
                self.assets.serve(&path).await
            }
            RouteDecision::ForwardUpstream => {
                debug!(remote = %remote, method = %req.method(), path = %path, "forwarding to upstream");
                match self.forwarder.forward(req).await {
                    Ok(resp) => resp,
                    Err(e) => bad_gateway_response(&e),
                }
            }
        }
    }
}
