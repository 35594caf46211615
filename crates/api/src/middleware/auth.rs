//! Authentication gate and identity extractor.
//!
//! Every request passes through [`AuthGate::authorize`] exactly once. The gate
//! either admits the request (optionally with a verified [`Identity`]) or
//! denies it with a 401. Handlers that need a caller use [`CurrentIdentity`].
//!
//! # Decision order
//!
//! 1. `OPTIONS` (CORS preflight) - admit, no identity
//! 2. Exempt path (health, auth status, actuator) - admit, no identity
//! 3. Development mode - admit, no identity, warn
//! 4. No `Bearer <token>` header - deny "missing or malformed credential"
//! 5. Token rejected by the verifier - deny "invalid credential"
//! 6. Otherwise admit with the verified identity

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, Method, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use fresh_cart_core::Identity;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, set_sentry_user};
use crate::identity::{ServiceInitializationFailure, TokenVerifier};

/// Paths that never require a credential unless overridden by `AUTH_EXEMPT_PATHS`.
pub const DEFAULT_EXEMPT_PATHS: &str = "/api/auth/status,/api/health,/actuator/**";

const BEARER_PREFIX: &str = "Bearer ";

/// How the gate was told to behave at startup.
///
/// Resolved once from configuration; never changes while the server runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Verify every protected request; refuse to start without a verifier.
    Strict,
    /// Verify every protected request; fall back to admitting everyone if the
    /// verifier cannot be built. Non-production only.
    Resilient,
    /// Admit every request without verification. Non-production only.
    DevelopmentOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    /// `/prefix/**`: the prefix itself and everything below it.
    Subtree(String),
}

/// The set of paths reachable without a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExemptPaths {
    patterns: Vec<PathPattern>,
}

impl ExemptPaths {
    /// Parse a comma-separated pattern list. A trailing `/**` matches a subtree.
    #[must_use]
    pub fn parse_list(raw: &str) -> Self {
        let patterns = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_suffix("/**") {
                Some(prefix) => PathPattern::Subtree(prefix.to_string()),
                None => PathPattern::Exact(s.to_string()),
            })
            .collect();
        Self { patterns }
    }

    /// An empty set: every path is protected.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Whether `path` is exempt from authentication.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Subtree(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/')),
        })
    }
}

impl Default for ExemptPaths {
    fn default() -> Self {
        Self::parse_list(DEFAULT_EXEMPT_PATHS)
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No `Authorization` header, or not of the form `Bearer <token>`.
    MissingCredential,
    /// The verifier rejected the token, for whatever reason.
    InvalidCredential,
}

impl DenyReason {
    /// The generic message sent to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing or malformed credential",
            Self::InvalidCredential => "invalid credential",
        }
    }
}

impl IntoResponse for DenyReason {
    fn into_response(self) -> Response {
        AppError::Unauthorized(self.message().to_string()).into_response()
    }
}

/// Result of authorizing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Let the request through, with the verified caller when there is one.
    Allow(Option<Identity>),
    /// Answer 401 without running the handler.
    Deny(DenyReason),
}

enum Enforcement {
    Verify(Arc<dyn TokenVerifier>),
    /// Development mode, configured or fallen back to.
    Open,
}

/// Per-request admission decision.
///
/// Cheaply cloneable via `Arc`. Holds only the boot-time configuration and
/// the verifier handle, both read-only after construction.
#[derive(Clone)]
pub struct AuthGate {
    inner: Arc<AuthGateInner>,
}

struct AuthGateInner {
    enforcement: Enforcement,
    exempt: ExemptPaths,
    warned_on_request: AtomicBool,
    development_warnings: AtomicUsize,
}

impl AuthGate {
    /// A gate that verifies every protected request with `verifier`.
    #[must_use]
    pub fn enforcing(verifier: Arc<dyn TokenVerifier>, exempt: ExemptPaths) -> Self {
        Self::with_enforcement(Enforcement::Verify(verifier), exempt)
    }

    /// A gate that admits everything. Warns immediately and again on the
    /// first admitted request.
    #[must_use]
    pub fn open(exempt: ExemptPaths) -> Self {
        let gate = Self::with_enforcement(Enforcement::Open, exempt);
        gate.warn_development_mode(
            "Authentication is DISABLED: every request is admitted without a credential",
        );
        gate
    }

    fn with_enforcement(enforcement: Enforcement, exempt: ExemptPaths) -> Self {
        Self {
            inner: Arc::new(AuthGateInner {
                enforcement,
                exempt,
                warned_on_request: AtomicBool::new(false),
                development_warnings: AtomicUsize::new(0),
            }),
        }
    }

    /// Build the gate for `mode`, calling `build_verifier` unless in development mode.
    ///
    /// # Errors
    ///
    /// Returns the verifier's `ServiceInitializationFailure` in strict mode.
    /// In resilient mode the failure is logged and an open gate is returned.
    pub fn initialize<F>(
        mode: AuthMode,
        exempt: ExemptPaths,
        build_verifier: F,
    ) -> Result<Self, ServiceInitializationFailure>
    where
        F: FnOnce() -> Result<Arc<dyn TokenVerifier>, ServiceInitializationFailure>,
    {
        match mode {
            AuthMode::DevelopmentOnly => Ok(Self::open(exempt)),
            AuthMode::Strict => {
                let verifier = build_verifier().inspect_err(|e| {
                    error!(error = %e, "Identity verification client failed to initialize");
                })?;
                info!("Authentication gate enforcing (strict)");
                Ok(Self::enforcing(verifier, exempt))
            }
            AuthMode::Resilient => match build_verifier() {
                Ok(verifier) => {
                    info!("Authentication gate enforcing (resilient)");
                    Ok(Self::enforcing(verifier, exempt))
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Identity verification client failed to initialize, falling back to development mode"
                    );
                    Ok(Self::open(exempt))
                }
            },
        }
    }

    /// Whether protected paths require a verified token.
    #[must_use]
    pub fn is_enforcing(&self) -> bool {
        matches!(self.inner.enforcement, Enforcement::Verify(_))
    }

    /// How many development-mode warnings this gate has emitted.
    #[must_use]
    pub fn development_warnings(&self) -> usize {
        self.inner.development_warnings.load(Ordering::Relaxed)
    }

    /// Decide whether a request may proceed and under which identity.
    pub async fn authorize(
        &self,
        method: &Method,
        path: &str,
        authorization: Option<&HeaderValue>,
    ) -> Outcome {
        if method == Method::OPTIONS {
            return Outcome::Allow(None);
        }

        if self.inner.exempt.matches(path) {
            return Outcome::Allow(None);
        }

        let verifier = match &self.inner.enforcement {
            Enforcement::Verify(verifier) => verifier,
            Enforcement::Open => {
                if !self.inner.warned_on_request.swap(true, Ordering::Relaxed) {
                    self.warn_development_mode(
                        "Admitting unauthenticated request: authentication is DISABLED",
                    );
                }
                return Outcome::Allow(None);
            }
        };

        let Some(token) = authorization.and_then(bearer_token) else {
            debug!(path, "Missing or malformed Authorization header");
            return Outcome::Deny(DenyReason::MissingCredential);
        };

        match verifier.verify(token).await {
            Ok(identity) => {
                info!(uid = %identity.uid(), "Token verified");
                Outcome::Allow(Some(identity))
            }
            Err(e) => {
                error!(error = %e, path, "Token verification failed");
                Outcome::Deny(DenyReason::InvalidCredential)
            }
        }
    }

    fn warn_development_mode(&self, message: &str) {
        self.inner
            .development_warnings
            .fetch_add(1, Ordering::Relaxed);
        warn!(development_mode = true, "{message}");
    }
}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme is case-sensitive and the token must be a single non-empty word.
fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let token = value.to_str().ok()?.strip_prefix(BEARER_PREFIX)?;
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Middleware running the gate on every request.
///
/// Any `Identity` already on the request is discarded first, so only the
/// gate can put one there.
pub async fn auth_gate_middleware(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().remove::<Identity>();

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let authorization = request.headers().get(AUTHORIZATION).cloned();

    let outcome = gate
        .authorize(&method, &path, authorization.as_ref())
        .await;

    match outcome {
        Outcome::Allow(identity) => {
            if let Some(identity) = identity {
                set_sentry_user(identity.uid());
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Outcome::Deny(reason) => reason.into_response(),
    }
}

/// Extractor for the verified caller of the current request.
///
/// Rejects with 401 when the gate attached no identity (exempt path,
/// development mode), so handlers never run without one.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentIdentity(identity): CurrentIdentity) -> String {
///     format!("Hello, {}!", identity.uid())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| {
                AppError::Unauthorized(DenyReason::MissingCredential.message().to_string())
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use fresh_cart_core::Uid;

    use super::*;
    use crate::identity::VerificationError;

    /// Accepts `good-token` as uid `abc`; counts calls.
    #[derive(Default)]
    struct FakeVerifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenVerifier for FakeVerifier {
        async fn verify(&self, token: &str) -> Result<Identity, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                "good-token" => Ok(Identity::new(Uid::parse("abc").unwrap())),
                "expired-token" => Err(VerificationError::Expired),
                _ => Err(VerificationError::InvalidSignature),
            }
        }
    }

    fn enforcing_gate() -> (AuthGate, Arc<FakeVerifier>) {
        let verifier = Arc::new(FakeVerifier::default());
        let gate = AuthGate::enforcing(verifier.clone(), ExemptPaths::default());
        (gate, verifier)
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_always_allowed() {
        let (gate, verifier) = enforcing_gate();
        let garbage = HeaderValue::from_static("Basic Zm9vOmJhcg==");
        for header in [None, Some(&garbage)] {
            for path in ["/api/orders", "/api/orders/history", "/anything"] {
                assert_eq!(
                    gate.authorize(&Method::OPTIONS, path, header).await,
                    Outcome::Allow(None)
                );
            }
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exempt_paths_allowed_without_identity() {
        let (gate, verifier) = enforcing_gate();
        for path in [
            "/api/health",
            "/api/auth/status",
            "/actuator",
            "/actuator/health",
            "/actuator/info",
        ] {
            assert_eq!(
                gate.authorize(&Method::GET, path, None).await,
                Outcome::Allow(None),
                "{path}"
            );
        }
        // Exempt paths ignore credentials entirely
        let outcome = gate
            .authorize(&Method::GET, "/api/health", Some(&bearer("good-token")))
            .await;
        assert_eq!(outcome, Outcome::Allow(None));
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exempt_subtree_does_not_match_siblings() {
        let exempt = ExemptPaths::default();
        assert!(!exempt.matches("/actuatorx"));
        assert!(!exempt.matches("/api/health/deep"));
        assert!(!exempt.matches("/api/orders"));
        assert!(ExemptPaths::parse_list("/**").matches("/api/orders"));
        assert!(!ExemptPaths::none().matches("/api/health"));
    }

    #[tokio::test]
    async fn test_development_mode_allows_and_warns() {
        let gate = AuthGate::open(ExemptPaths::default());
        assert!(!gate.is_enforcing());
        assert_eq!(gate.development_warnings(), 1);

        for _ in 0..3 {
            assert_eq!(
                gate.authorize(&Method::POST, "/api/orders", None).await,
                Outcome::Allow(None)
            );
        }
        // Once at construction, once on the first admitted request
        assert_eq!(gate.development_warnings(), 2);
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header() {
        let (gate, verifier) = enforcing_gate();
        let headers = [
            HeaderValue::from_static("good-token"),
            HeaderValue::from_static("bearer good-token"),
            HeaderValue::from_static("Bearer "),
            HeaderValue::from_static("Bearer two words"),
            HeaderValue::from_static("Basic Zm9vOmJhcg=="),
        ];

        assert_eq!(
            gate.authorize(&Method::GET, "/api/orders/history", None)
                .await,
            Outcome::Deny(DenyReason::MissingCredential)
        );
        for header in &headers {
            assert_eq!(
                gate.authorize(&Method::GET, "/api/orders/history", Some(header))
                    .await,
                Outcome::Deny(DenyReason::MissingCredential),
                "{header:?}"
            );
        }
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rejected_token_is_invalid_credential() {
        let (gate, _) = enforcing_gate();
        for token in ["expired-token", "forged-token"] {
            assert_eq!(
                gate.authorize(&Method::POST, "/api/orders", Some(&bearer(token)))
                    .await,
                Outcome::Deny(DenyReason::InvalidCredential)
            );
        }
    }

    #[tokio::test]
    async fn test_accepted_token_yields_identity() {
        let (gate, verifier) = enforcing_gate();
        let outcome = gate
            .authorize(&Method::POST, "/api/orders", Some(&bearer("good-token")))
            .await;
        let Outcome::Allow(Some(identity)) = outcome else {
            panic!("expected identity, got {outcome:?}");
        };
        assert_eq!(identity.uid().as_str(), "abc");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_same_token_twice_same_identity() {
        let (gate, verifier) = enforcing_gate();
        let header = bearer("good-token");
        let first = gate
            .authorize(&Method::GET, "/api/orders/history", Some(&header))
            .await;
        let second = gate
            .authorize(&Method::GET, "/api/orders/history", Some(&header))
            .await;
        assert_eq!(first, second);
        // Verified per request, never cached by the gate
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deny_is_always_401() {
        for reason in [DenyReason::MissingCredential, DenyReason::InvalidCredential] {
            assert_eq!(reason.into_response().status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_strict_init_failure_is_fatal() {
        let result = AuthGate::initialize(AuthMode::Strict, ExemptPaths::default(), || {
            Err(ServiceInitializationFailure::MissingCredentialsPath)
        });
        assert!(matches!(
            result,
            Err(ServiceInitializationFailure::MissingCredentialsPath)
        ));
    }

    #[test]
    fn test_resilient_init_failure_falls_back_open() {
        let gate = AuthGate::initialize(AuthMode::Resilient, ExemptPaths::default(), || {
            Err(ServiceInitializationFailure::MissingCredentialsPath)
        })
        .unwrap();
        assert!(!gate.is_enforcing());
        assert!(gate.development_warnings() >= 1);
    }

    #[test]
    fn test_init_success_enforces() {
        for mode in [AuthMode::Strict, AuthMode::Resilient] {
            let gate = AuthGate::initialize(mode, ExemptPaths::default(), || {
                Ok(Arc::new(FakeVerifier::default()) as Arc<dyn TokenVerifier>)
            })
            .unwrap();
            assert!(gate.is_enforcing());
            assert_eq!(gate.development_warnings(), 0);
        }
    }

    #[test]
    fn test_development_mode_never_builds_verifier() {
        let gate = AuthGate::initialize(AuthMode::DevelopmentOnly, ExemptPaths::default(), || {
            panic!("verifier must not be built in development mode")
        })
        .unwrap();
        assert!(!gate.is_enforcing());
    }
}
