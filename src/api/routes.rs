//! HTTP API route definitions.

use axum::http::HeaderValue;
use axum::{
    routing::{any, get},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{health, metrics_page, relay, AppState};
use crate::error::RelayError;

/// CORS policy applied to every response.
///
/// `"*"` allows any origin; anything else must be a single origin.
pub fn cors_layer(origin: &str) -> Result<CorsLayer, RelayError> {
    let allow_origin = if origin == "*" {
        AllowOrigin::any()
    } else {
        let value = HeaderValue::from_str(origin)
            .map_err(|e| RelayError::InvalidConfig(format!("CORS_ALLOW_ORIGIN: {}", e)))?;
        AllowOrigin::exact(value)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Create the API router.
pub fn create_router(state: AppState, relay_path: &str, cors: CorsLayer) -> Router {
    Router::new()
        // Relay endpoint
        .route(relay_path, any(relay))
        // Health endpoints
        .route("/health", get(health))
        .route("/metrics", get(metrics_page))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
