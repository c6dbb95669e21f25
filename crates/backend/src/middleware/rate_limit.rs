//! Rate limiting for submission endpoints (`POST /messages`, `POST /orders`).
//!
//! Clients are keyed by the first proxy-reported address, falling back to the
//! socket peer address when the server is reached directly.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Proxy headers consulted for the client address, in order.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor using proxy headers, then the connection's peer address.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        let forwarded = CLIENT_IP_HEADERS.iter().find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        });

        forwarded
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for form submissions: ~12 requests per minute per IP, burst of 5.
///
/// # Panics
///
/// Panics if the governor configuration is invalid (zero period or burst size).
#[must_use]
pub fn submission_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(5)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(5) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    #[test]
    fn test_prefers_first_forwarded_address() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("198.51.100.2:4000".parse::<SocketAddr>().unwrap()));
        assert_eq!(
            ClientIpKeyExtractor.extract(&req).unwrap(),
            "198.51.100.2".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_no_address_is_an_error() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}
