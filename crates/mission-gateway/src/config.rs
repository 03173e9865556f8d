//! Gateway configuration: environment/CLI values resolved once at startup.
//!
//! The configuration is immutable for the process lifetime. It is validated
//! here so that a bad deployment (missing bundle directory) fails before the
//! listener binds, never per-request.

use crate::error::{GatewayError, GatewayResult};
use std::path::PathBuf;
use tracing::warn;

/// URL path segment that routes to the dashboard bundle.
pub const MOUNT_PREFIX: &str = "/mission";

/// Name of the session cookie issued after token authentication.
pub const COOKIE_NAME: &str = "mc_token";

/// Root HTML document of the bundle, also the SPA fallback target.
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Session cookie lifetime in seconds (24 hours).
pub const COOKIE_MAX_AGE_SECS: u64 = 86_400;

/// Resolved gateway configuration.
///
/// Built once in `main` from CLI flags / environment variables and passed
/// into each component explicitly. Request handling never mutates it.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Port the gateway listens on (all interfaces).
    pub listen_port: u16,
    /// Upstream backend host.
    pub upstream_host: String,
    /// Upstream backend port.
    pub upstream_port: u16,
    /// Directory holding the pre-built dashboard bundle.
    pub bundle_dir: PathBuf,
    /// Shared-secret access token. `None` disables the auth gate.
    pub auth_token: Option<String>,
}

impl GatewayConfig {
    /// Build and validate a configuration.
    ///
    /// An empty token string is treated the same as no token at all: auth
    /// disabled. The bundle directory must exist and be a directory.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`] if the bundle directory is missing
    /// or is not a directory.
    pub fn new(
        listen_port: u16,
        upstream_host: String,
        upstream_port: u16,
        bundle_dir: PathBuf,
        auth_token: Option<String>,
    ) -> GatewayResult<Self> {
        let auth_token = auth_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if !bundle_dir.is_dir() {
            return Err(GatewayError::Config(format!(
                "bundle directory not found: {}",
                bundle_dir.display()
            )));
        }

        if auth_token.is_none() {
            warn!("no access token configured — dashboard is open");
        }

        Ok(Self {
            listen_port,
            upstream_host,
            upstream_port,
            bundle_dir,
            auth_token,
        })
    }

    /// `host:port` of the upstream backend.
    pub fn upstream_addr(&self) -> String {
        format!("{}:{}", self.upstream_host, self.upstream_port)
    }
}
