//! Maps internal failures onto HTTP responses, following
//! `ferrex-server::errors::AppError`'s shape: a status + message pair with
//! `From` impls for the error types each handler actually returns.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Every other exceptional condition returns 500 with a generic
        // body; 4xx responses carry the actual diagnostic, 500 never
        // leaks internals.
        let body = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            json!({ "error": "Internal server error" })
        } else {
            json!({ "error": self.message })
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<pseudovision_core::CoreError> for AppError {
    fn from(err: pseudovision_core::CoreError) -> Self {
        use pseudovision_core::CoreError;
        match err {
            CoreError::NoSchedule => Self::bad_request(err.to_string()),
            CoreError::ResolutionFailure(_) | CoreError::UnknownFillMode { .. } => {
                Self::internal(err.to_string())
            }
            CoreError::TransactionFailure(_) | CoreError::InvariantViolation(_) => {
                Self::internal(err.to_string())
            }
            CoreError::Model(_) => Self::bad_request(err.to_string()),
        }
    }
}

impl From<pseudovision_model::ModelError> for AppError {
    fn from(err: pseudovision_model::ModelError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("not found"),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
