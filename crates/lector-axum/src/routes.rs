//! Route definitions and router construction.
//!
//! Axum 0.8 brace syntax is used for any path parameters.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            use axum::http::HeaderValue;
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// All API routes without the `/api` prefix.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        // Reader sessions
        .route("/reader/session", get(handlers::reader::status))
        .route("/reader/session/start", post(handlers::reader::start))
        .route("/reader/session/next", get(handlers::reader::next))
        .route("/reader/session/commit", post(handlers::reader::commit))
        .route("/reader/session/barge_in", post(handlers::reader::barge_in))
        .route("/reader/session/seek", post(handlers::reader::seek))
        .route("/reader/session/rewind", post(handlers::reader::rewind))
        .route("/reader/session/manual", post(handlers::reader::manual))
        .route(
            "/reader/session/continuous",
            post(handlers::reader::continuous),
        )
        .route("/reader/session/stop", post(handlers::reader::stop))
        // Library
        .route("/reader/rescan", post(handlers::library::rescan))
        .route("/reader/books", get(handlers::library::list))
}

/// Create the main Axum router with all API routes.
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes().with_state(state).layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint.
pub(crate) async fn health_check() -> &'static str {
    "OK"
}
