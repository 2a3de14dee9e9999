use crate::protocol::{ErrResponse, PLUGIN_CONTENT_TYPE};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use zfsvol_driver::DriverError;

/// API error type
///
/// Docker only looks at the `Err` field of a failed call; the status code
/// is there for humans and proxies.
#[derive(Debug)]
pub enum ApiError {
    /// Volume not found (404)
    NotFound(String),

    /// Volume already exists (409)
    AlreadyExists(String),

    /// Invalid input (400)
    BadRequest(String),

    /// Pool or filesystem failure (500)
    Internal(String),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::AlreadyExists(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg) => msg,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrResponse::new(self.message()));

        (
            status,
            [(header::CONTENT_TYPE, PLUGIN_CONTENT_TYPE)],
            body,
        )
            .into_response()
    }
}

impl From<DriverError> for ApiError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::VolumeNotFound { .. } => ApiError::NotFound(err.to_string()),
            DriverError::VolumeAlreadyExists { .. } => ApiError::AlreadyExists(err.to_string()),
            _ if err.is_validation() => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}
