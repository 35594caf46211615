//! Health and build-info endpoints.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

use crate::state::AppState;

const SERVICE_NAME: &str = "Fresh Cart API";

/// Body of `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    pub message: &'static str,
}

/// Liveness check. Never touches dependencies.
pub async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        timestamp: Utc::now().to_rfc3339(),
        service: SERVICE_NAME,
        message: "Service is running properly",
    })
}

/// Readiness check.
///
/// Returns 503 if the database is not reachable.
pub async fn actuator_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.orders().ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "UP" }))),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "DOWN" })),
            )
        }
    }
}

/// Build name and version.
pub async fn actuator_info() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
