//! Static bundle serving with SPA fallback.
//!
//! Maps a request path under the mount prefix to a file inside the bundle
//! directory. Anything that does not resolve to a regular file is answered
//! with the entry document so client-side routing keeps working.

use super::{full_body, ProxyBody};
use crate::config::{GatewayConfig, ENTRY_DOCUMENT, MOUNT_PREFIX};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error};

/// Serves files from the pre-built dashboard bundle.
///
/// The bundle directory is read-only and safe for unsynchronized concurrent
/// reads, so the resolver holds nothing but its path.
pub struct StaticAssetResolver {
    bundle_dir: PathBuf,
}

impl StaticAssetResolver {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            bundle_dir: config.bundle_dir.clone(),
        }
    }

    /// Serve the bundle file for a request path already routed to the bundle.
    ///
    /// Resolution order:
    /// 1. Strip the mount prefix (and a single following slash); an empty
    ///    remainder means the entry document.
    /// 2. Confine the relative path to the bundle directory; traversal
    ///    attempts resolve to nothing and fall through.
    /// 3. Serve the file bytes with the extension-derived content type.
    /// 4. Otherwise serve the entry document (SPA fallback, still 200).
    ///
    /// A missing entry document is a deployment error and yields a 500
    /// rather than a crash.
    pub async fn serve(&self, path: &str) -> Response<ProxyBody> {
        let relative = relative_path(path);

        if let Some(confined) = sanitize(relative) {
            let full = self.bundle_dir.join(&confined);
            if let Some(bytes) = read_regular_file(&full).await {
                return file_response(bytes, content_type(&confined));
            }
            debug!(path = %path, "bundle file not found, serving entry document");
        } else {
            debug!(path = %path, "path escapes bundle root, serving entry document");
        }

        // SPA fallback
        let entry = self.bundle_dir.join(ENTRY_DOCUMENT);
        match read_regular_file(&entry).await {
            Some(bytes) => file_response(bytes, content_type(Path::new(ENTRY_DOCUMENT))),
            None => {
                error!(
                    bundle = %self.bundle_dir.display(),
                    "entry document missing from bundle"
                );
                let mut resp = Response::new(full_body("dashboard bundle is missing its entry document\n"));
                *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                resp.headers_mut()
                    .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                resp
            }
        }
    }
}

/// Strip the mount prefix and at most one following slash.
///
/// `/mission` and `/mission/` both map to the entry document.
fn relative_path(path: &str) -> &str {
    let rest = path.strip_prefix(MOUNT_PREFIX).unwrap_or(path);
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    if rest.is_empty() {
        ENTRY_DOCUMENT
    } else {
        rest
    }
}

/// Confine a relative path to the bundle root.
///
/// Rejects `..` segments, absolute components, and anything else that is not
/// a plain sequence of normal path segments.
fn sanitize(relative: &str) -> Option<PathBuf> {
    let mut confined = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => confined.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if confined.as_os_str().is_empty() {
        return None;
    }
    Some(confined)
}

/// Read a path only if it exists and is a regular file.
async fn read_regular_file(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => tokio::fs::read(path).await.ok(),
        _ => None,
    }
}

/// Fixed extension-to-MIME table; unknown extensions are served as opaque
/// binary.
fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn file_response(bytes: Vec<u8>, mime: &'static str) -> Response<ProxyBody> {
    let mut resp = Response::new(full_body(bytes));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(mime));
    resp
}
