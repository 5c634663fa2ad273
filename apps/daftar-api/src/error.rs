//! Error types for the Daftar API.
//!
//! ```text
//! DbError / ValidationError / CoreError
//!        │
//!        ▼
//!   ApiError { status, code, message }
//!        │
//!        ▼
//!   HTTP status + {"error": message, "code": CODE}
//! ```
//!
//! | Source                        | Status | Code               |
//! |-------------------------------|--------|--------------------|
//! | Validation                    | 400    | `VALIDATION_ERROR` |
//! | missing / bad token           | 401    | `UNAUTHENTICATED`  |
//! | PermissionDenied              | 403    | `FORBIDDEN`        |
//! | NotFound                      | 404    | `NOT_FOUND`        |
//! | UniqueViolation / FK conflict | 409    | `CONFLICT`         |
//! | anything else                 | 500    | `INTERNAL`         |
//!
//! Internal failures are logged and replaced by an opaque message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use daftar_core::{CoreError, ValidationError};
use daftar_db::DbError;
use serde_json::json;
use tracing::{error, warn};

/// Message sent for every 500.
pub const SERVER_ERROR_MESSAGE: &str = "Server error occurred";

/// An error as HTTP clients see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    /// Logs `detail` and returns the opaque 500.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!(error = %detail, "Request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", SERVER_ERROR_MESSAGE)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { .. } => ApiError::not_found(err.to_string()),
            CoreError::PermissionDenied { .. } => ApiError::forbidden(err.to_string()),
            CoreError::Validation(v) => v.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(v) => v.into(),
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::PermissionDenied { .. } => {
                warn!(error = %err, "Permission denied");
                ApiError::forbidden(err.to_string())
            }
            DbError::UniqueViolation { .. } => ApiError::conflict(err.to_string()),
            DbError::ForeignKeyViolation { .. } => {
                ApiError::conflict("Record is still referenced by other records")
            }
            other => ApiError::internal(other),
        }
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_to_statuses() {
        let cases = [
            (DbError::Validation(ValidationError::required("subject")), StatusCode::BAD_REQUEST),
            (DbError::not_found("Person", 4), StatusCode::NOT_FOUND),
            (DbError::denied("delete invoices"), StatusCode::FORBIDDEN),
            (DbError::duplicate("username", "ali"), StatusCode::CONFLICT),
            (DbError::QueryFailed("disk I/O error".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_are_opaque() {
        let err = ApiError::from(DbError::Internal("secret path /var/db".into()));
        assert_eq!(err.message, SERVER_ERROR_MESSAGE);
        assert_eq!(err.code, "INTERNAL");
    }
}
