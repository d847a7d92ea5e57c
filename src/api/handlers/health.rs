use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub mode: String,
    pub version: String,
}

/// Liveness probe; no side effects, stable across repeated calls
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        mode: state.config.mode.as_str().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
