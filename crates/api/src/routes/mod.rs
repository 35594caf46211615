//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Public (exempt from authentication)
//! GET  /api/health              - Liveness with service metadata
//! GET  /api/auth/status         - Whether tokens are required
//! GET  /actuator/health         - Readiness (database ping)
//! GET  /actuator/info           - Build name and version
//!
//! # Orders (requires a verified identity)
//! POST /api/orders              - Place an order
//! GET  /api/orders/history      - Caller's orders, newest first
//! GET  /api/orders/system-check - Order count and database status
//! ```

pub mod auth;
pub mod health;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the public routes router.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::api_health))
        .route("/api/auth/status", get(auth::status))
        .route("/actuator/health", get(health::actuator_health))
        .route("/actuator/info", get(health::actuator_info))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/api/orders", post(orders::place_order))
        .route("/api/orders/history", get(orders::history))
        .route("/api/orders/system-check", get(orders::system_check))
}

/// Create the complete router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new().merge(public_routes()).merge(order_routes())
}
