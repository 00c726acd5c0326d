//! Route modules for the ingest gateway

pub mod health;
pub mod upload;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/claims", upload::router(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
