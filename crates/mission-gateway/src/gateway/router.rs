//! Routing decision for inbound requests.
//!
//! The decision uses exactly two inputs: whether the request asks for a
//! connection upgrade, and whether its path sits under the mount prefix.
//! Method, query string, and all other headers are ignored.

use crate::config::MOUNT_PREFIX;
use hyper::header::{self, HeaderMap};

/// Where an inbound request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Serve from the dashboard bundle (auth gate + static resolver).
    ServeBundle,
    /// Relay to the upstream backend (plain forward or tunnel).
    ForwardUpstream,
}

/// Whether the request headers ask for a protocol upgrade.
///
/// Requires both an `Upgrade` header and a `Connection` header carrying the
/// `upgrade` token, matching what an HTTP/1.1 client sends to open a
/// WebSocket.
pub fn is_upgrade_request(headers: &HeaderMap) -> bool {
    if !headers.contains_key(header::UPGRADE) {
        return false;
    }
    headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        })
        .unwrap_or(false)
}

/// Decide how to route a request.
///
/// Evaluated in order:
/// 1. Upgrade requests always forward: the bundle is static content and can
///    never service a socket.
/// 2. Paths under the mount prefix serve the bundle. The match is anchored
///    to a path-segment boundary, so `/missionary` does not count as under
///    `/mission`.
/// 3. Everything else forwards.
pub fn decide(path: &str, is_upgrade: bool) -> RouteDecision {
    if is_upgrade {
        return RouteDecision::ForwardUpstream;
    }
    if under_mount_prefix(path) {
        return RouteDecision::ServeBundle;
    }
    RouteDecision::ForwardUpstream
}

/// Anchored prefix match: the prefix itself, or the prefix followed by `/`.
fn under_mount_prefix(path: &str) -> bool {
    match path.strip_prefix(MOUNT_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
