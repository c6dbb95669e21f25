//! Security headers middleware for XSS and clickjacking protection.
//!
//! Adds restrictive security headers to all responses. The CSP is locked down
//! to this origin plus the content backend (media), htmx from unpkg and the
//! third-party widgets the CMS can enable (reCAPTCHA, analytics, chat).

use axum::{
    extract::{Request, State},
    http::{
        HeaderName, HeaderValue,
        header::{
            CONTENT_SECURITY_POLICY, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
        },
    },
    middleware::Next,
    response::Response,
};
use url::Url;

use crate::state::AppState;

/// Third-party script origins: htmx, reCAPTCHA, analytics and chat.
const SCRIPT_SOURCES: &str = "https://unpkg.com https://www.google.com https://www.gstatic.com \
                              https://www.googletagmanager.com https://embed.tawk.to";

/// Endpoints the analytics and chat widgets talk to.
const CONNECT_SOURCES: &str = "https://www.google-analytics.com https://*.tawk.to wss://*.tawk.to";

/// Build the Content-Security-Policy for a storefront backed by `api_url`.
///
/// Media is served by the content backend, so its origin is allowed for images
/// and downloads.
#[must_use]
pub fn content_security_policy(api_url: &str) -> HeaderValue {
    let backend_origin = Url::parse(api_url)
        .map(|url| url.origin().ascii_serialization())
        .ok()
        .filter(|origin| origin != "null")
        .unwrap_or_default();

    let policy = format!(
        "default-src 'none'; \
         script-src 'self' {SCRIPT_SOURCES}; \
         style-src 'self' https://embed.tawk.to; \
         font-src 'self'; \
         img-src 'self' data: {backend_origin}; \
         connect-src 'self' {CONNECT_SOURCES}; \
         frame-src https://www.google.com https://*.tawk.to; \
         object-src 'none'; \
         base-uri 'self'; \
         form-action 'self'; \
         frame-ancestors 'none'"
    );

    HeaderValue::from_str(&policy).unwrap_or_else(|_| {
        tracing::warn!(api_url, "Backend origin not usable in CSP, dropping it");
        HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'")
    })
}

/// Add security headers to all responses.
///
/// Headers applied:
/// - `X-Frame-Options: DENY` - Prevent clickjacking
/// - `X-Content-Type-Options: nosniff` - Prevent MIME sniffing
/// - `Referrer-Policy: strict-origin-when-cross-origin`
/// - `Content-Security-Policy` - see [`content_security_policy`]
/// - `Permissions-Policy` - Deny sensitive features
/// - `Cross-Origin-Opener-Policy: same-origin` - Process isolation
pub async fn security_headers_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(CONTENT_SECURITY_POLICY, state.csp().clone());

    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static(
            "camera=(), \
             geolocation=(), \
             microphone=(), \
             payment=(), \
             usb=()",
        ),
    );

    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_allows_backend_media() {
        let csp = content_security_policy("http://localhost:1337/api");
        let csp = csp.to_str().unwrap();
        assert!(csp.contains("img-src 'self' data: http://localhost:1337;"));
        assert!(csp.contains("https://www.gstatic.com"));
        assert!(csp.contains("frame-ancestors 'none'"));
    }
}
