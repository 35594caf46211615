//! Service-credential check.
//!
//! Loads the bundle through the same code path the API uses at startup, so a
//! bad file is caught before a deploy rather than by the auth gate.
//!
//! # Usage
//!
//! ```bash
//! fc-cli credentials check --file ./service-account.json
//! ```

use std::path::PathBuf;

use fresh_cart_api::identity::{CredentialsError, ServiceAccount};
use thiserror::Error;

/// Errors from the credential check.
#[derive(Debug, Error)]
pub enum CredentialsCheckError {
    /// Neither `--file` nor the environment variable was given.
    #[error("No credential file given: pass --file or set {0}")]
    MissingPath(&'static str),

    #[error(transparent)]
    Invalid(#[from] CredentialsError),
}

const PATH_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_FILE";

/// Validate the bundle at `file`, or at `FIREBASE_SERVICE_ACCOUNT_FILE`.
///
/// Only the project id and client email are reported; the private key never is.
///
/// # Errors
///
/// Returns `CredentialsCheckError` if no path is known or the bundle is invalid.
pub fn check(file: Option<PathBuf>) -> Result<(), CredentialsCheckError> {
    dotenvy::dotenv().ok();

    let path = file
        .or_else(|| std::env::var_os(PATH_ENV).map(PathBuf::from))
        .ok_or(CredentialsCheckError::MissingPath(PATH_ENV))?;

    let account = ServiceAccount::load(&path)?;

    tracing::info!(
        path = %path.display(),
        project_id = %account.project_id,
        client_email = %account.client_email,
        "Service credentials are valid"
    );
    Ok(())
}
