//! Identity provider integration.
//!
//! Bearer tokens are opaque to this service. Whether one is valid, and whose
//! it is, is decided by the identity provider (Firebase Authentication). This
//! module holds the [`TokenVerifier`] seam the auth gate depends on, the
//! Firebase implementation of it, and the service-credential bundle it is
//! initialized from.

mod credentials;
mod error;
mod firebase;

use std::sync::Arc;

use async_trait::async_trait;
use fresh_cart_core::Identity;

use crate::config::AuthConfig;

pub use credentials::{CredentialsError, ServiceAccount};
pub use error::{ServiceInitializationFailure, VerificationError};
pub use firebase::{
    DEFAULT_JWKS_URL, DEFAULT_KEYS_REFRESH_INTERVAL, FirebaseClaims, FirebaseTokenVerifier,
};

/// Turns a bearer token into the identity it was issued to.
///
/// Implementations are shared across all in-flight requests and must not
/// keep per-request state. Verifying the same valid token twice yields the
/// same identity.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` (already stripped of its `Bearer ` prefix).
    ///
    /// # Errors
    ///
    /// Returns a `VerificationError` describing why the token was rejected.
    /// Callers must not forward the error to clients.
    async fn verify(&self, token: &str) -> Result<Identity, VerificationError>;
}

/// Build the production verifier from the configured service-credential bundle.
///
/// # Errors
///
/// Returns `ServiceInitializationFailure` if no bundle path is configured, the
/// bundle cannot be loaded, or the HTTP client cannot be constructed.
pub fn build_verifier(
    config: &AuthConfig,
) -> Result<Arc<dyn TokenVerifier>, ServiceInitializationFailure> {
    let path = config
        .service_account_file
        .as_deref()
        .ok_or(ServiceInitializationFailure::MissingCredentialsPath)?;

    let account = ServiceAccount::load(path)?;
    tracing::info!(
        project_id = %account.project_id,
        client_email = %account.client_email,
        "Service credentials loaded"
    );

    let verifier = FirebaseTokenVerifier::new(
        account.project_id.clone(),
        config.jwks_url.clone(),
        config.keys_ttl,
        config.keys_refresh_interval,
    )?;

    Ok(Arc::new(verifier))
}
