use crate::api::ErrorResponse;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Failures a handler can answer with. Each renders as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    KeyNotFound,
    BackendUnavailable,
    InvalidInput(String),
    /// A request the extractors refused, with the status they chose.
    Rejected(StatusCode, String),
    RouteNotFound,
    MethodNotAllowed,
}

impl From<shared::Error> for ApiError {
    fn from(err: shared::Error) -> Self {
        match err {
            shared::Error::BackendUnavailable(_) => ApiError::BackendUnavailable,
            shared::Error::InvalidInput(reason) => ApiError::InvalidInput(reason),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::KeyNotFound => (StatusCode::NOT_FOUND, "Key not found".to_string()),
            ApiError::BackendUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Redis connection failed".to_string(),
            ),
            ApiError::InvalidInput(reason) => (StatusCode::BAD_REQUEST, reason),
            ApiError::Rejected(status, reason) => (status, reason),
            ApiError::RouteNotFound => (StatusCode::NOT_FOUND, "Route not found".to_string()),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
