use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;

/// Build and configure the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Readiness
        .route("/status", get(handlers::status))
        // Cache operation routes
        .route(
            "/cache",
            post(handlers::put_values).get(handlers::get_value),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The router behind trailing-slash normalization. The path has to be
/// rewritten before routing, so the layer wraps the whole router.
pub fn build_service(state: AppState) -> NormalizePath<Router> {
    NormalizePath::trim_trailing_slash(build_router(state))
}
