use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::monitor::scheduler::TargetCheckError;
use crate::monitor::target_store::TargetError;
use crate::notifications::config_store::ConfigError;
use crate::notifications::service::NotificationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<TargetError> for AppError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::DuplicateId(_) => AppError::Conflict(err.to_string()),
            _ if err.is_validation() => AppError::InvalidInput(err.to_string()),
            _ => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        if err.is_validation() {
            AppError::InvalidInput(err.to_string())
        } else {
            AppError::InternalServerError(err.to_string())
        }
    }
}

impl From<NotificationError> for AppError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::ConfigMissing => AppError::InvalidInput(err.to_string()),
            NotificationError::SendFailed(_) => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<TargetCheckError> for AppError {
    fn from(err: TargetCheckError) -> Self {
        match err {
            TargetCheckError::NotFound(_) => AppError::NotFound(err.to_string()),
            TargetCheckError::Busy => AppError::Conflict(err.to_string()),
            TargetCheckError::Check(_) => AppError::Upstream(err.to_string()),
            TargetCheckError::Storage(_) => AppError::InternalServerError(err.to_string()),
            TargetCheckError::Aborted(_) => AppError::InternalServerError(err.to_string()),
        }
    }
}
