//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (no third-party scripts at all)
//! 5. Session layer (tower-sessions with the memory store)
//! 6. Auth extractors on every route except login

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
