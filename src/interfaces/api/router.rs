use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // Trailing slashes kept for compatibility with existing clients
        .route("/predict-rent/", post(handlers::predict_rent))
        .route("/predict-rent-12-months/", post(handlers::predict_rent_12_months))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
