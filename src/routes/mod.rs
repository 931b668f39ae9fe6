//! API Routes
//!
//! - `/`, `/health` - open
//! - `/login` - admin credential check
//! - `/upload`, `/dataset`, `/dataset/summary` - dataset operations
//!
//! Everything except the open routes sits behind the API key gate.

pub mod auth;
pub mod dataset;
pub mod health;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::{apply_cors, require_api_key};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let protected = Router::new()
        .merge(auth::router())
        .merge(dataset::router(state.config.server.max_upload_bytes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let router = Router::new()
        .merge(health::router())
        .merge(protected)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &state.config.server.cors_allowed_origins)
}
