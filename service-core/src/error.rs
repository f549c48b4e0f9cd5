use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced across the HTTP boundary.
///
/// Every variant renders as the failure envelope `{"success": false, "error": ...}`
/// so API consumers only ever see one response shape.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Body of every failed response.
#[derive(Debug, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub error: String,
}

impl FailureEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => {
                tracing::warn!(status = %status, "{}", msg);
            }
            AppError::InternalError(err) | AppError::ConfigError(err) => {
                tracing::error!(status = %status, error = ?err, "Request failed");
            }
        }

        (status, Json(FailureEnvelope::new(self.to_string()))).into_response()
    }
}
