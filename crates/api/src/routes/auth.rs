//! Authentication status probe.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /api/auth/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub status: &'static str,
    pub auth_required: bool,
    pub message: &'static str,
}

/// Tell clients whether protected endpoints need a bearer token.
pub async fn status(State(state): State<AppState>) -> Json<AuthStatusResponse> {
    let auth_required = state.gate().is_enforcing();
    let message = if auth_required {
        "Authentication required for all endpoints except public ones"
    } else {
        "Authentication is disabled on this deployment"
    };

    Json(AuthStatusResponse {
        status: "Server is running",
        auth_required,
        message,
    })
}
