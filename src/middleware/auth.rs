// API key gate and admin credential check
//
// Both compare by plain string equality against values fixed at startup.
// There is no hashing or constant-time comparison.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::models::AppState;
use crate::types::{AppError, AppResult};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone, Default)]
pub struct AccessGate {
    api_key: Option<String>,
}

impl AccessGate {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    /// An absent or empty token, or an unset key, is always rejected.
    pub fn check(&self, presented: Option<&str>) -> AppResult<()> {
        match (presented, self.api_key.as_deref()) {
            (Some(token), Some(expected)) if !token.is_empty() && token == expected => Ok(()),
            _ => Err(AppError::Unauthorized("Invalid or missing API key".to_string())),
        }
    }
}

#[derive(Clone, Default)]
pub struct AdminCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl AdminCredentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.username.as_deref() == Some(username) && self.password.as_deref() == Some(password)
    }
}

pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(e) = state.gate.check(presented) {
        warn!(path = %req.uri().path(), "Rejected request without a valid API key");
        return Err(e);
    }

    Ok(next.run(req).await)
}
