use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::models::{AppState, LoginRequest, StatusMessage};
use crate::types::{AppError, AppResult};

pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Checks the admin credentials. No session is created; callers keep sending
/// the API key.
async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<StatusMessage>> {
    let Json(request) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;

    if state.credentials.verify(&request.username, &request.password) {
        info!("Admin login succeeded");
        Ok(Json(StatusMessage::ok("Login successful")))
    } else {
        warn!("Admin login failed");
        Err(AppError::Unauthorized("Invalid username or password".to_string()))
    }
}
