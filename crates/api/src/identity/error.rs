//! Identity provider error types.

use std::sync::Arc;

use thiserror::Error;

use super::CredentialsError;

/// Why a bearer token was rejected.
///
/// Logged server-side only. The auth gate collapses every variant into a
/// single generic 401 so clients learn nothing about the cause.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Not a structurally valid JWT.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Signed with something other than RS256.
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Header has no `kid`.
    #[error("token header has no key id")]
    MissingKeyId,

    /// `kid` does not match any current signing key, even after a refresh.
    #[error("no signing key with id {0}")]
    UnknownKeyId(String),

    /// A published signing key could not be used.
    #[error("unusable signing key: {0}")]
    SigningKey(String),

    /// The signing-key endpoint could not be reached or returned garbage.
    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(Arc<reqwest::Error>),

    /// `exp` is in the past.
    #[error("token expired")]
    Expired,

    /// Signature does not match the signing key.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Audience, issuer, subject or timestamps are wrong.
    #[error("invalid token claims: {0}")]
    InvalidClaims(String),
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                Self::UnsupportedAlgorithm(err.to_string())
            }
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::InvalidClaims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::SigningKey(err.to_string())
            }
            _ => Self::MalformedToken(err.to_string()),
        }
    }
}

/// The verification client could not be constructed at startup.
///
/// Depending on the configured posture this either aborts startup or drops
/// the gate into development behavior with a warning. It is never ignored.
#[derive(Debug, Error)]
pub enum ServiceInitializationFailure {
    /// No bundle path configured.
    #[error("no service credential file configured (FIREBASE_SERVICE_ACCOUNT_FILE)")]
    MissingCredentialsPath,

    /// The bundle could not be read or is invalid.
    #[error("failed to load service credentials: {0}")]
    Credentials(#[from] CredentialsError),

    /// The HTTP client for the signing-key endpoint could not be built.
    #[error("failed to build identity provider client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
