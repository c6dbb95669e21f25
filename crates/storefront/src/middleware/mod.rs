//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main`)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//! 6. Rate limiting on form and cart routes (governor)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use rate_limit::{ClientIp, cart_rate_limiter, form_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
