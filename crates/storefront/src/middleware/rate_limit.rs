//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `form_rate_limiter`: strict limits for contact and checkout submissions
//! - `cart_rate_limiter`: relaxed limits for cart mutations
//! - `ClientIp`: the same visitor address, for forwarding to the content backend

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{Extensions, HeaderMap, Request, request::Parts};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Proxy headers consulted for the client address, in order.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor that trusts proxy headers first (first hop of
/// `X-Forwarded-For`), then the socket peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers(), req.extensions()).ok_or(GovernorError::UnableToExtractKey)
    }
}

fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

/// Visitor address as seen by the rate limiters, forwarded to the content
/// backend so its own per-client limits see shoppers rather than this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(client_ip(&parts.headers, &parts.extensions)))
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for contact and checkout forms: ~10 requests per minute per IP.
///
/// # Panics
///
/// Panics if the governor configuration is invalid (zero period or burst size).
#[must_use]
pub fn form_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Rate limiter for cart mutations: one per second per IP with a burst of 30.
///
/// # Panics
///
/// Panics if the governor configuration is invalid (zero period or burst size).
#[must_use]
pub fn cart_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_second(1) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_cloudflare_header_wins() {
        let req = Request::builder()
            .header("cf-connecting-ip", "203.0.113.1")
            .header("x-forwarded-for", "198.51.100.9")
            .body(())
            .unwrap();
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.1".parse::<IpAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_client_ip_extractor_matches_limiter_key() {
        let (mut parts, ()) = Request::builder()
            .header("x-forwarded-for", "198.51.100.9, 10.0.0.2")
            .body(())
            .unwrap()
            .into_parts();
        let ClientIp(ip) = ClientIp::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ip, Some("198.51.100.9".parse::<IpAddr>().unwrap()));

        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(ClientIp::from_request_parts(&mut parts, &()).await.unwrap(), ClientIp(None));
    }

    #[test]
    fn test_peer_address_fallback() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.10:51000".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "192.0.2.10".parse::<IpAddr>().unwrap()
        );
    }
}
