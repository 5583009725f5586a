//! API Routes
//!
//! Configures the Axum router with all parameter cache endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_param_handler, get_param_handler, get_params_handler, health_handler,
    stats_handler, update_param_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /params/:code` - Resolve one parameter (`?default=`, `?ttl_ms=`)
/// - `PUT /params/:code` - Write-through update
/// - `DELETE /params/:code` - Invalidate one parameter
/// - `GET /params?codes=a,b` - Resolve several parameters concurrently
/// - `DELETE /params` - Clear the whole pool
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin, the console is served from a different host
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/params", get(get_params_handler).delete(clear_handler))
        .route(
            "/params/:code",
            get(get_param_handler)
                .put(update_param_handler)
                .delete(delete_param_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
