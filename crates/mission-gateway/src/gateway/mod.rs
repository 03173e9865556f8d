//! Gateway module — routing, static bundle serving, auth, forwarding, and
//! WebSocket tunneling.
//!
//! # Submodule Architecture
//!
//! The gateway is composed of five cooperating submodules:
//!
//! - **[`router`]** — Turns an inbound request's path and upgrade intent into
//!   a [`RouteDecision`](router::RouteDecision). Upgrade requests always
//!   forward; bundle routes are matched on an anchored path-segment prefix.
//!
//! - **[`assets`]** — The [`StaticAssetResolver`] maps a bundle-route path to
//!   a file inside the bundle directory, serving it with a fixed
//!   extension-to-MIME table and falling back to the entry document for
//!   anything that does not resolve to a regular file (SPA routing).
//!
//! - **[`auth`]** — The [`AuthGate`] validates the shared-secret token from
//!   a query parameter or session cookie, exchanging a valid query token for
//!   a cookie plus redirect. Bypassed entirely when no token is configured.
//!
//! - **[`forwarder`]** — The [`HttpForwarder`] relays a non-upgrade request
//!   to the upstream over a fresh connection, streaming both bodies, and
//!   answers 502 when the upstream cannot be reached.
//!
//! - **[`tunnel`]** — The [`WebSocketTunnel`] replays an upgrade handshake
//!   against the upstream and, once both legs have switched protocols,
//!   splices the two raw sockets until either side closes.
//!
//! # Data Flow
//!
//! ```text
//! Inbound request
//!   → handle (server.rs)
//!     → router::decide
//!         upgrade            → WebSocketTunnel::establish
//!         under /mission     → AuthGate::check → StaticAssetResolver::serve
//!         everything else    → HttpForwarder::forward
//! ```

pub mod assets;
pub mod auth;
pub mod forwarder;
pub mod router;
pub mod tunnel;

pub use assets::StaticAssetResolver;
pub use auth::AuthGate;
pub use forwarder::HttpForwarder;
pub use tunnel::WebSocketTunnel;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};

/// Unified response body type: full-buffered local responses and streamed
/// upstream bodies share it.
pub type ProxyBody = BoxBody<Bytes, hyper::Error>;

/// Wrap a full byte payload into the unified body type.
pub(crate) fn full_body(bytes: impl Into<Bytes>) -> ProxyBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Create an empty body (used for 101/302 responses).
pub(crate) fn empty_body() -> ProxyBody {
    Empty::new().map_err(|never| match never {}).boxed()
}
