//! HTTP API module: the relay endpoint plus health and metrics.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::{cors_layer, create_router};
