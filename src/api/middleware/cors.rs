//! CORS configuration.

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::Config;

/// Production: explicit origin allow-list from configuration. The frontend
/// must send credentials (CSRF cookie), so wildcards are not an option.
fn production_cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(86400))
}

/// Development: permissive, mirrors the request origin so cookies still
/// work against localhost frontends.
fn development_cors_layer() -> CorsLayer {
    // Credentials forbid wildcard values, so methods stay an explicit list
    // even here.
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Select the CORS layer for the configured environment.
pub fn create_cors_layer(config: &Config) -> CorsLayer {
    if config.environment.is_production() {
        production_cors_layer(config)
    } else {
        development_cors_layer()
    }
}
