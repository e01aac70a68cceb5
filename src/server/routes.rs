//! Route definitions for the API server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::auth;
use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // Create CORS layer (allow all origins; the public surface is read-only)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Ingest and raw-event routes require the API key
    let protected = Router::new()
        .route(
            "/events",
            post(handlers::ingest_event).get(handlers::list_events),
        )
        .route("/events/bulk", post(handlers::ingest_bulk))
        .route("/metrics/summary", get(handlers::metrics_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    // Build router with routes
    Router::new()
        // Health check
        .route("/ping", get(handlers::ping))
        // Public read-only surface (aggregates only, no raw events)
        .route(
            "/public/metrics/summary",
            get(handlers::public_metrics_summary),
        )
        .route("/dashboard", get(handlers::dashboard))
        .merge(protected)
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Add shared state
        .with_state(state)
}
