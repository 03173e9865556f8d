//! Token auth gate for the dashboard route.
//!
//! A shared-secret token may arrive as the `token` query parameter or as the
//! session cookie. A valid query token is exchanged for the cookie plus a
//! redirect to the bundle root, so the secret does not linger in browser
//! history. The cookie carries no server-side state: it is re-checked by
//! byte equality against the configured token on every request.

use super::{empty_body, full_body, ProxyBody};
use crate::config::{GatewayConfig, COOKIE_MAX_AGE_SECS, COOKIE_NAME, MOUNT_PREFIX};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use hyper::{Response, StatusCode, Uri};
use url::form_urlencoded;

/// Outcome of the auth check for a bundle-route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// Request may proceed to the static resolver.
    Allow,
    /// Valid token arrived as a query parameter: set the cookie and redirect.
    IssueCookie,
    /// No valid token from either source.
    Deny,
}

/// Validates dashboard access tokens.
pub struct AuthGate {
    token: Option<String>,
}

impl AuthGate {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            token: config.auth_token.clone(),
        }
    }

    /// Whether a token is configured at all.
    pub fn enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Check a request against the configured token.
    ///
    /// The query parameter is consulted first, then the cookie. With no
    /// token configured every request is allowed (open mode; announced at
    /// startup).
    pub fn check(&self, uri: &Uri, headers: &HeaderMap) -> AuthDecision {
        let Some(expected) = self.token.as_deref() else {
            return AuthDecision::Allow;
        };

        if query_token(uri).as_deref() == Some(expected) {
            return AuthDecision::IssueCookie;
        }
        if cookie_value(headers, COOKIE_NAME).as_deref() == Some(expected) {
            return AuthDecision::Allow;
        }
        AuthDecision::Deny
    }

    /// Build the redirect that exchanges a query token for the session
    /// cookie. The Location drops the query string.
    pub fn issue_cookie_response(&self) -> Response<ProxyBody> {
        let token = self.token.as_deref().unwrap_or_default();
        let cookie = format!(
            "{}={}; Path={}; HttpOnly; SameSite=Strict; Max-Age={}",
            COOKIE_NAME, token, MOUNT_PREFIX, COOKIE_MAX_AGE_SECS
        );

        let mut resp = Response::new(empty_body());
        *resp.status_mut() = StatusCode::FOUND;
        resp.headers_mut().insert(
            SET_COOKIE,
            HeaderValue::from_str(&cookie).unwrap_or(HeaderValue::from_static("")),
        );
        resp.headers_mut()
            .insert(LOCATION, HeaderValue::from_static(MOUNT_ROOT));
        resp
    }

    /// Build the 401 response with a short hint on how to authenticate.
    pub fn unauthorized_response(&self) -> Response<ProxyBody> {
        let mut resp = Response::new(full_body(
            "<h2>Mission Control</h2><p>Unauthorized. Append ?token=YOUR_TOKEN to authenticate.</p>",
        ));
        *resp.status_mut() = StatusCode::UNAUTHORIZED;
        resp.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        resp
    }
}

/// Redirect target after a successful token exchange: the bundle root.
const MOUNT_ROOT: &str = "/mission/";

/// Extract the `token` query parameter, if any.
fn query_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

/// Extract a cookie value by name from the `Cookie` header.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let header = headers.get(COOKIE)?.to_str().ok()?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(token: Option<&str>) -> AuthGate {
        AuthGate {
            token: token.map(String::from),
        }
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_open_mode_allows_everything() {
        let gate = gate(None);
        let uri: Uri = "/mission/".parse().unwrap();
        assert_eq!(gate.check(&uri, &HeaderMap::new()), AuthDecision::Allow);
    }

    #[test]
    fn test_query_token_issues_cookie() {
        let gate = gate(Some("s3cret"));
        let uri: Uri = "/mission/?token=s3cret".parse().unwrap();
        assert_eq!(gate.check(&uri, &HeaderMap::new()), AuthDecision::IssueCookie);
    }

    #[test]
    fn test_wrong_query_token_is_denied() {
        let gate = gate(Some("s3cret"));
        let uri: Uri = "/mission/?token=nope".parse().unwrap();
        assert_eq!(gate.check(&uri, &HeaderMap::new()), AuthDecision::Deny);
    }

    #[test]
    fn test_cookie_allows_through() {
        let gate = gate(Some("s3cret"));
        let uri: Uri = "/mission/".parse().unwrap();
        let headers = cookie_headers("mc_token=s3cret");
        assert_eq!(gate.check(&uri, &headers), AuthDecision::Allow);
    }

    #[test]
    fn test_cookie_among_others_is_found() {
        let gate = gate(Some("s3cret"));
        let uri: Uri = "/mission/".parse().unwrap();
        let headers = cookie_headers("theme=dark; mc_token=s3cret; lang=en");
        assert_eq!(gate.check(&uri, &headers), AuthDecision::Allow);
    }

    #[test]
    fn test_missing_token_is_denied() {
        let gate = gate(Some("s3cret"));
        let uri: Uri = "/mission/".parse().unwrap();
        assert_eq!(gate.check(&uri, &HeaderMap::new()), AuthDecision::Deny);
    }

    #[test]
    fn test_redirect_sets_cookie_and_location() {
        let gate = gate(Some("s3cret"));
        let resp = gate.issue_cookie_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/mission/");

        let cookie = resp.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("mc_token=s3cret"));
        assert!(cookie.contains("Path=/mission"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_unauthorized_response() {
        let gate = gate(Some("s3cret"));
        let resp = gate.unauthorized_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
