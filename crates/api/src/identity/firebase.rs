//! Firebase ID token verification.
//!
//! Firebase ID tokens are RS256 JWTs signed by Google. Verification follows
//! the provider's published rules:
//!
//! - header `alg` is `RS256` and `kid` names a current signing key
//! - `aud` is the project id, `iss` is `https://securetoken.google.com/<project id>`
//! - `exp` is in the future, `iat` and `auth_time` are not
//! - `sub` is a non-empty uid of at most 128 characters
//!
//! Signing keys are fetched from the JWK endpoint with `reqwest` and cached
//! with `moka`; concurrent misses share one fetch. A `kid` that is not in the
//! cached set triggers a refetch, which is how key rotation is picked up
//! before the TTL runs out. Such refetches happen at most once per refresh
//! interval, since anyone can put an arbitrary `kid` in a token header.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use fresh_cart_core::{Identity, Uid};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{TokenVerifier, VerificationError};

/// Google's JWK endpoint for Firebase ID token signing keys.
pub const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Allowed clock skew between us and the provider, in seconds.
const CLOCK_SKEW_SECONDS: i64 = 60;

const KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum time between refetches caused by an unknown `kid`.
pub const DEFAULT_KEYS_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const SIGNING_KEYS: &str = "signing-keys";

/// Claims carried by a Firebase ID token that this service looks at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// The user's uid.
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    /// When the user actually signed in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,
}

/// Verifies Firebase ID tokens for one project.
///
/// Cheaply cloneable via `Arc`; safe to share across requests.
#[derive(Clone)]
pub struct FirebaseTokenVerifier {
    inner: Arc<FirebaseTokenVerifierInner>,
}

struct FirebaseTokenVerifierInner {
    client: reqwest::Client,
    jwks_url: String,
    project_id: String,
    issuer: String,
    keys: Cache<String, Arc<JwkSet>>,
    refresh_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl FirebaseTokenVerifier {
    /// Create a verifier for `project_id`.
    ///
    /// Fetched keys are trusted for `keys_ttl`. An unknown `kid` refetches
    /// them early, but never sooner than `refresh_interval` after the last fetch.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(
        project_id: String,
        jwks_url: String,
        keys_ttl: Duration,
        refresh_interval: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(KEY_FETCH_TIMEOUT)
            .build()?;

        let keys = Cache::builder()
            .max_capacity(1)
            .time_to_live(keys_ttl)
            .build();

        let issuer = format!("{ISSUER_PREFIX}{project_id}");

        Ok(Self {
            inner: Arc::new(FirebaseTokenVerifierInner {
                client,
                jwks_url,
                project_id,
                issuer,
                keys,
                refresh_interval,
                last_fetch: Mutex::new(None),
            }),
        })
    }

    /// The project whose tokens this verifier accepts.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.inner.project_id
    }

    /// Find the signing key for `kid`, refetching once if it is not cached
    /// and the refresh interval allows it.
    async fn signing_key(&self, kid: &str) -> Result<Jwk, VerificationError> {
        let keys = self.current_keys().await?;
        if let Some(jwk) = keys.find(kid) {
            return Ok(jwk.clone());
        }

        if !self.claim_refresh() {
            debug!(kid, "Unknown key id, refresh interval not yet elapsed");
            return Err(VerificationError::UnknownKeyId(kid.to_string()));
        }

        self.inner.keys.invalidate(SIGNING_KEYS).await;
        let keys = self.current_keys().await?;
        keys.find(kid)
            .cloned()
            .ok_or_else(|| VerificationError::UnknownKeyId(kid.to_string()))
    }

    /// The cached key set, fetched on a miss. Concurrent misses share one fetch.
    async fn current_keys(&self) -> Result<Arc<JwkSet>, VerificationError> {
        self.inner
            .keys
            .try_get_with(SIGNING_KEYS.to_string(), self.fetch_keys())
            .await
            .map_err(VerificationError::KeyFetch)
    }

    /// Take the right to refetch early. Only one caller per interval gets it.
    fn claim_refresh(&self) -> bool {
        let mut last_fetch = self
            .inner
            .last_fetch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let allowed =
            last_fetch.is_none_or(|at| at.elapsed() >= self.inner.refresh_interval);
        if allowed {
            *last_fetch = Some(Instant::now());
        }
        allowed
    }

    async fn fetch_keys(&self) -> Result<Arc<JwkSet>, reqwest::Error> {
        debug!(url = %self.inner.jwks_url, "Fetching identity provider signing keys");
        *self
            .inner
            .last_fetch
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());

        let keys: JwkSet = self
            .inner
            .client
            .get(&self.inner.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(Arc::new(keys))
    }

    /// Check signature and claims of `token` against one signing key.
    fn verify_with_key(&self, token: &str, jwk: &Jwk) -> Result<Identity, VerificationError> {
        let key = DecodingKey::from_jwk(jwk)?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.inner.project_id]);
        validation.set_issuer(&[&self.inner.issuer]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);
        validation.leeway = CLOCK_SKEW_SECONDS.unsigned_abs();

        let claims = decode::<FirebaseClaims>(token, &key, &validation)?.claims;

        let latest_allowed = Utc::now().timestamp() + CLOCK_SKEW_SECONDS;
        if claims.iat > latest_allowed {
            return Err(VerificationError::InvalidClaims(
                "iat is in the future".to_string(),
            ));
        }
        if let Some(auth_time) = claims.auth_time
            && auth_time > latest_allowed
        {
            return Err(VerificationError::InvalidClaims(
                "auth_time is in the future".to_string(),
            ));
        }

        let uid = Uid::parse(&claims.sub)
            .map_err(|e| VerificationError::InvalidClaims(format!("sub: {e}")))?;

        Ok(Identity::new(uid))
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    #[instrument(skip_all, fields(project_id = %self.inner.project_id))]
    async fn verify(&self, token: &str) -> Result<Identity, VerificationError> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerificationError::UnsupportedAlgorithm(format!(
                "{:?}",
                header.alg
            )));
        }
        let kid = header.kid.ok_or(VerificationError::MissingKeyId)?;

        let jwk = self.signing_key(&kid).await?;
        self.verify_with_key(token, &jwk)
    }
}
