// Crime Intelligence System - dataset upload and retrieval API

pub mod config;
pub mod models;
pub mod types;
pub mod ingest;
pub mod analysis;  // Summary statistics over the stored dataset
pub mod storage;
pub mod routes;
pub mod middleware;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
