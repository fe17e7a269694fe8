//! Application assembly.
//!
//! The router is built in two steps: the registrar composes the feature
//! modules, then [`with_interceptors`] wraps the result in the request
//! lifecycle layers. Listed outermost first:
//!
//! 1. HTTP tracing
//! 2. CORS
//! 3. request id assignment, then propagation to the response
//! 4. response normalization
//! 5. panic capture
//!
//! Per-route authentication runs inside all of these.

use axum::{Router, http::HeaderValue, middleware};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::middleware::request_id::{propagate_request_id, request_id_layer};
use crate::modules;
use crate::normalize::{normalize_response, panic_response};
use crate::registrar::{Registrar, RegistrationError};
use crate::state::Services;

/// Startup failures while assembling the application.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("invalid CORS origin {0:?}")]
    InvalidCorsOrigin(String),
}

/// Build the complete application router.
pub fn build_app(config: &ServerConfig, services: &Services) -> Result<Router, StartupError> {
    let mut registrar = Registrar::new(services.verifier().clone());
    modules::register_all(&mut registrar, services, config)?;

    for route in registrar.route_table() {
        tracing::debug!(
            module = route.module,
            method = %route.method,
            path = route.path,
            access = ?route.access,
            "route"
        );
    }

    with_interceptors(registrar.into_router(), config)
}

/// Wrap `router` in the request lifecycle layers.
pub fn with_interceptors(router: Router, config: &ServerConfig) -> Result<Router, StartupError> {
    let cors = build_cors_layer(&config.cors_allowed_origins)?;

    Ok(router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(normalize_response))
        .layer(middleware::from_fn(propagate_request_id))
        .layer(request_id_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

/// Build CORS layer from configuration.
pub fn build_cors_layer(allowed_origins: &str) -> Result<CorsLayer, StartupError> {
    if allowed_origins.trim() == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    // Parse comma-separated origins
    let origins = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<HeaderValue>()
                .map_err(|_| StartupError::InvalidCorsOrigin(s.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any))
}
