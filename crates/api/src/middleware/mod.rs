//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. CORS (answers preflight before anything else runs)
//! 3. `TraceLayer` (request span)
//! 4. Request ID (add unique ID to each request)
//! 5. Security headers
//! 6. Auth gate (admit or deny, attach identity)

pub mod auth;
pub mod cors;
pub mod request_id;
pub mod security_headers;

pub use auth::{
    AuthGate, AuthMode, CurrentIdentity, DenyReason, ExemptPaths, Outcome, auth_gate_middleware,
};
pub use cors::cors_layer;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use security_headers::security_headers_middleware;
