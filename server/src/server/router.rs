use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;

use super::{api, assets};
use crate::app::SharedState;

/// Create the axum router with all routes.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(assets::index))
        .route("/health", get(api::health::health))
        .route("/generate", get(api::generate::generate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
