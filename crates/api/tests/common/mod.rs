//! Shared helpers for HTTP-level tests.
//!
//! The router under test is the real one from `fresh_cart_api::app`. Only the
//! two collaborators are swapped: an in-memory order store and a verifier
//! that knows a fixed set of tokens.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use fresh_cart_api::{
    config::{ApiConfig, AuthConfig, CorsConfig},
    db::{OrderStore, RepositoryError},
    identity::{DEFAULT_JWKS_URL, TokenVerifier, VerificationError},
    middleware::{AuthGate, AuthMode, ExemptPaths},
    models::{NewOrder, Order},
    state::AppState,
};
use fresh_cart_core::{Identity, OrderId, Uid};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

/// Order store kept in a `Vec`, counting every call made to it.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: Mutex<Vec<Order>>,
    calls: AtomicUsize,
}

impl MemoryOrderStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<Order> {
        self.orders.lock().unwrap().clone()
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.record_call();
        let mut orders = self.orders.lock().unwrap();
        let order = Order {
            id: OrderId::new(i64::try_from(orders.len()).unwrap() + 1),
            user_id: order.user_id,
            product_id: order.product_id,
            quantity: order.quantity,
            amount: order.amount,
            order_time: order.order_time,
        };
        orders.push(order.clone());
        Ok(order)
    }

    async fn list_by_user(&self, user_id: &Uid) -> Result<Vec<Order>, RepositoryError> {
        self.record_call();
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .iter()
            .filter(|o| &o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_time.cmp(&a.order_time).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        self.record_call();
        Ok(i64::try_from(self.orders.lock().unwrap().len()).unwrap())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.record_call();
        Ok(())
    }
}

/// Verifier that accepts a fixed token-to-uid table.
pub struct StaticVerifier {
    tokens: HashMap<String, String>,
}

impl StaticVerifier {
    pub fn new(tokens: &[(&str, &str)]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .map(|(token, uid)| ((*token).to_string(), (*uid).to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerificationError> {
        let uid = self
            .tokens
            .get(token)
            .ok_or_else(|| VerificationError::MalformedToken("kid=secret-internal-detail".into()))?;
        Ok(Identity::new(Uid::parse(uid).unwrap()))
    }
}

pub const ABC_TOKEN: &str = "token-for-abc";
pub const XYZ_TOKEN: &str = "token-for-xyz";

pub fn test_config(mode: AuthMode) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/fresh_cart_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        auth: AuthConfig {
            mode,
            service_account_file: None,
            jwks_url: DEFAULT_JWKS_URL.to_string(),
            keys_ttl: Duration::from_secs(3600),
            keys_refresh_interval: Duration::from_secs(60),
            exempt_paths: ExemptPaths::default(),
        },
        cors: CorsConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Router with an enforcing gate that knows `ABC_TOKEN` and `XYZ_TOKEN`.
pub fn enforcing_app(store: Arc<MemoryOrderStore>) -> Router {
    let verifier = Arc::new(StaticVerifier::new(&[(ABC_TOKEN, "abc"), (XYZ_TOKEN, "xyz")]));
    app_with_gate(
        AuthMode::Strict,
        store,
        AuthGate::enforcing(verifier, ExemptPaths::default()),
    )
}

/// Router with a gate in development mode.
pub fn development_app(store: Arc<MemoryOrderStore>) -> (Router, AuthGate) {
    let gate = AuthGate::open(ExemptPaths::default());
    let app = app_with_gate(AuthMode::DevelopmentOnly, store, gate.clone());
    (app, gate)
}

pub fn app_with_gate(mode: AuthMode, store: Arc<MemoryOrderStore>, gate: AuthGate) -> Router {
    let state = AppState::new(test_config(mode), store, gate);
    fresh_cart_api::app(state)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
