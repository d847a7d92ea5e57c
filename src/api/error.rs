use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::intake::IntakeError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Internal Server Error")]
    Internal { message: String, expose: bool },
}

impl AppError {
    /// Wraps an unexpected failure. `expose` controls whether the detail is
    /// echoed in the response body (development mode and the diagnostic
    /// endpoint) or only logged (production).
    pub fn internal(err: impl std::fmt::Display, expose: bool) -> Self {
        AppError::Internal {
            message: err.to_string(),
            expose,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Intake(e) if e.is_client_error() => {
                let body = Json(json!({
                    "success": false,
                    "error": e.to_string(),
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::Intake(e) => {
                tracing::error!("Staging error: {}", e);
                let body = Json(json!({
                    "success": false,
                    "error": "Internal Server Error",
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
            AppError::Internal { message, expose } => {
                tracing::error!("Internal error: {}", message);
                let body = if expose {
                    Json(json!({
                        "success": false,
                        "error": "Internal Server Error",
                        "details": message,
                    }))
                } else {
                    Json(json!({
                        "success": false,
                        "error": "Internal Server Error",
                    }))
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_intake_errors_map_to_bad_request() {
        let response = AppError::from(IntakeError::NoFiles).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_staging_io_maps_to_internal_error() {
        let io = IntakeError::Io(std::io::Error::other("disk full"));
        let response = AppError::from(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_error_status() {
        let response = AppError::internal("boom", false).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
