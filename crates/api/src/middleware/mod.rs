//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (`http_request` span per request)
//! 3. Request ID (record on span, echo in response)
//! 4. CORS
//! 5. Rate limiting on `/api/auth/*` (governor)
//!
//! Authentication is not a layer: handlers opt in with the `RequireAuth` and
//! `RequireVendor` extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{AuthRejection, RequireAuth, RequireVendor};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
