//! HTTP middleware for the content API.

pub mod rate_limit;
pub mod request_id;

pub use rate_limit::{RateLimiterLayer, submission_rate_limiter};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
