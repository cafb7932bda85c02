//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (tower-sessions with the memory store)
//! 6. Rate limiting (governor) on form endpoints only

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalCustomer, RequireCustomer, clear_current_customer, login_url, safe_next,
    set_current_customer,
};
pub use rate_limit::form_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
