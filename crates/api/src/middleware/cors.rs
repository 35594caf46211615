//! Cross-origin access for the browser client.

use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer from configuration.
///
/// Credentials are allowed, so origins, methods and headers are always
/// explicit lists rather than wildcards.
#[must_use]
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.allowed_origins.clone()))
        .allow_methods(config.allowed_methods.clone())
        .allow_headers(config.allowed_headers.clone())
        .allow_credentials(true)
        .max_age(config.max_age)
}
