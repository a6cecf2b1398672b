//! HTTP error responses.
//!
//! Domain failures leave the service as `{code, message}` JSON with the status
//! implied by their [`ErrorKind`]. Request-shape problems (missing fields) are
//! plain-text 400s and never carry a domain code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use idp_shared::{ErrorKind, PlatformError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Wrapper giving [`PlatformError`] an HTTP shape.
#[derive(Debug)]
pub struct ApiError(pub PlatformError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Domain | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        };

        // Infrastructure details stay in the logs.
        let message = if self.0.kind == ErrorKind::Internal {
            "internal error".to_string()
        } else {
            self.0.message.clone()
        };

        let body = ErrorBody {
            code: self.0.code().to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PlatformError> for ApiError {
    fn from(err: PlatformError) -> Self {
        Self(err)
    }
}

/// Plain-text 400 used for request-body validation.
pub fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, message.to_string()).into_response()
}
