// HTTP error responses.
// Maps the error taxonomy onto status codes with `{"detail": ...}` bodies.

use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::error::PrStatusError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<PrStatusError> for ApiError {
    fn from(error: PrStatusError) -> Self {
        let status = match &error {
            PrStatusError::Unauthorized | PrStatusError::MissingToken => StatusCode::UNAUTHORIZED,
            PrStatusError::RateLimited { .. } => StatusCode::FORBIDDEN,
            PrStatusError::NotFound(_) => StatusCode::NOT_FOUND,
            PrStatusError::InvalidRepository { .. } => StatusCode::BAD_REQUEST,
            PrStatusError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %error, "request failed");
        }
        Self::new(status, error.to_string())
    }
}

/// Malformed query strings are validation failures, not plain-text 400s.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
