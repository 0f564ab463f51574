//! Per-client rate limiting of the credential routes.
//!
//! Registration and login are limited per client IP to slow down password
//! guessing. Deployments not behind a proxy that sets client IP headers turn
//! it off with `MARKET_AUTH_RATE_LIMIT=false`.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::config::MarketConfig;

/// Headers carrying the client address, most trusted first.
///
/// `x-forwarded-for` may hold a chain; its first entry is the client.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor reading the client IP from proxy headers.
///
/// Requests without any of these headers are rejected by the limiter.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();

        CLIENT_IP_HEADERS
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.split(',').next())
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Limiter layer for the credential routes.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Limiter for `/api/auth/register` and `/api/auth/login`, or `None` when
/// `MARKET_AUTH_RATE_LIMIT` turned it off.
///
/// One request replenished every 6 seconds, bursts of 5 per client IP.
///
/// # Panics
///
/// Never: `per_second(6)` and `burst_size(5)` are both non-zero.
#[must_use]
pub fn auth_rate_limiter(config: &MarketConfig) -> Option<RateLimiterLayer> {
    if !config.auth_rate_limit {
        tracing::warn!("Rate limiting on /api/auth is disabled");
        return None;
    }

    let governor = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("per_second(6) and burst_size(5) are non-zero");
    Some(GovernorLayer::new(Arc::new(governor)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "203.0.113.7"),
        ]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_uses_first_forwarded_address() {
        let req = request(&[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
        let ip = ClientIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.2".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_no_headers_is_an_error() {
        assert!(ClientIpKeyExtractor.extract(&request(&[])).is_err());
    }
}
