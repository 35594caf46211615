//! HTTP-level tests for the auth gate: who gets in, who doesn't, and what
//! a denied caller sees.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use fresh_cart_api::middleware::{AuthGate, AuthMode, ExemptPaths};
use serde_json::json;

use common::{
    ABC_TOKEN, MemoryOrderStore, StaticVerifier, app_with_gate, body_json, development_app,
    enforcing_app, get, post_json, send,
};

#[tokio::test]
async fn test_health_needs_no_credential() {
    let store = Arc::new(MemoryOrderStore::default());
    let (dev_app, _) = development_app(store.clone());

    for app in [enforcing_app(store.clone()), dev_app] {
        let response = send(&app, get("/api/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "UP");
        assert_eq!(body["service"], "Fresh Cart API");
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_history_without_header_is_401_and_store_untouched() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store.clone());

    let response = send(&app, get("/api/orders/history", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(
        body,
        json!({
            "status": 401,
            "error": "Unauthorized",
            "message": "missing or malformed credential"
        })
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_malformed_scheme_is_missing_credential() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store.clone());

    let request = Request::builder()
        .uri("/api/orders/history")
        .header(header::AUTHORIZATION, format!("Token {ABC_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "missing or malformed credential"
    );
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_rejected_token_is_generic_401() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store.clone());

    let response = send(&app, get("/api/orders/history", Some("forged"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "invalid credential");
    // Verifier detail stays in the logs
    assert!(!body.to_string().contains("secret-internal-detail"));
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_preflight_passes_without_credential() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/orders")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "authorization,content-type",
        )
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
        "true"
    );
}

#[tokio::test]
async fn test_actuator_subtree_is_exempt() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store);

    let response = send(&app, get("/actuator/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "UP" }));

    let response = send(&app, get("/actuator/info", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "fresh-cart-api");
}

#[tokio::test]
async fn test_unknown_path_is_protected() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store);

    let response = send(&app, get("/api/admin", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_status_reports_enforcement() {
    let store = Arc::new(MemoryOrderStore::default());

    let response = send(&enforcing_app(store.clone()), get("/api/auth/status", None)).await;
    let body = body_json(response).await;
    assert_eq!(body["status"], "Server is running");
    assert_eq!(body["authRequired"], true);

    let (dev_app, _) = development_app(store);
    let body = body_json(send(&dev_app, get("/api/auth/status", None)).await).await;
    assert_eq!(body["authRequired"], false);
}

#[tokio::test]
async fn test_development_mode_admits_but_handlers_need_identity() {
    let store = Arc::new(MemoryOrderStore::default());
    let (app, gate) = development_app(store.clone());

    let response = send(
        &app,
        post_json(
            "/api/orders",
            None,
            &json!({ "productId": "p1", "quantity": 1, "amount": 1.0 }),
        ),
    )
    .await;

    // Gate admitted it, but there is no identity to own the order
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(store.calls(), 0);
    assert!(gate.development_warnings() >= 2);
}

#[tokio::test]
async fn test_custom_exempt_list_replaces_defaults() {
    let store = Arc::new(MemoryOrderStore::default());
    let gate = AuthGate::enforcing(
        Arc::new(StaticVerifier::new(&[])),
        ExemptPaths::parse_list("/api/health"),
    );
    let app = app_with_gate(AuthMode::Strict, store, gate);

    let response = send(&app, get("/api/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/actuator/health", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let store = Arc::new(MemoryOrderStore::default());
    let app = enforcing_app(store);

    let request = Request::builder()
        .uri("/api/orders/history")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
}
