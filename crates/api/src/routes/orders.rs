//! Order endpoints. All of them require a verified identity.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::CurrentIdentity;
use crate::models::{Order, PlaceOrderRequest};
use crate::services::OrderService;
use crate::state::AppState;

/// Place an order for the caller.
///
/// The owner and timestamp come from the server, never the body.
pub async fn place_order(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    body: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let order = OrderService::new(state.orders())
        .place_order(&identity, request)
        .await?;

    Ok(Json(order))
}

/// The caller's orders, newest first.
pub async fn history(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderService::new(state.orders())
        .history(&identity)
        .await?;

    Ok(Json(orders))
}

/// Body of `GET /api/orders/system-check`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCheckResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub total_orders: Option<i64>,
    pub database_connection_active: bool,
}

/// Order count and database reachability.
pub async fn system_check(
    State(state): State<AppState>,
    CurrentIdentity(_): CurrentIdentity,
) -> (StatusCode, Json<SystemCheckResponse>) {
    let timestamp = Utc::now().to_rfc3339();

    match state.orders().count().await {
        Ok(total) => (
            StatusCode::OK,
            Json(SystemCheckResponse {
                status: "UP",
                timestamp,
                total_orders: Some(total),
                database_connection_active: true,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "System check could not count orders");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(SystemCheckResponse {
                    status: "DOWN",
                    timestamp,
                    total_orders: None,
                    database_connection_active: false,
                }),
            )
        }
    }
}
