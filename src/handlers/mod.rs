pub mod mock_source;
pub mod refresh;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{ControllerError, FetchError};

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Upstream(FetchError),
    BadRequest(String),
    AlreadyRunning,
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        Self::Upstream(value)
    }
}

impl From<ControllerError> for AppError {
    fn from(value: ControllerError) -> Self {
        match value {
            ControllerError::AlreadyRunning => Self::AlreadyRunning,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Upstream(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::AlreadyRunning => (
                StatusCode::CONFLICT,
                "Refresh controller already running".into(),
            ),
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
