//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps ledger errors to HTTP status codes and returns JSON bodies with a
//! machine-readable code and a message. Internal details never reach the
//! client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use certreg_core::ValidationError;
use certreg_ledger::LedgerError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "FORBIDDEN").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Argument failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body or query could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller is not an admin (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Request conflicts with ledger state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Logged, not returned to the client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unauthorized { .. } => Self::Forbidden(err.to_string()),
            LedgerError::NotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::InvalidArgument(inner) => Self::Validation(inner.to_string()),
            LedgerError::CapacityExhausted | LedgerError::AlreadyBootstrapped => {
                Self::Conflict(err.to_string())
            }
            LedgerError::Journal(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use certreg_core::{Address, CertificateId};
    use certreg_ledger::JournalError;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn ledger_unauthorized_is_forbidden() {
        let err = AppError::from(LedgerError::Unauthorized {
            caller: Address::new("0xB").unwrap(),
        });
        assert_eq!(err.status_and_code(), (StatusCode::FORBIDDEN, "FORBIDDEN"));
    }

    #[test]
    fn ledger_not_found_is_404() {
        let err = AppError::from(LedgerError::NotFound(CertificateId::new(999).unwrap()));
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "NOT_FOUND"));
        assert!(err.to_string().contains("999"));
    }

    #[test]
    fn ledger_invalid_argument_is_422() {
        let err = AppError::from(LedgerError::InvalidArgument(ValidationError::EmptyField {
            field: "studentName",
        }));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
    }

    #[test]
    fn ledger_capacity_is_conflict() {
        let err = AppError::from(LedgerError::CapacityExhausted);
        assert_eq!(err.status_and_code(), (StatusCode::CONFLICT, "CONFLICT"));
    }

    #[test]
    fn journal_error_is_internal() {
        let err = AppError::from(LedgerError::Journal(JournalError::MissingGenesis));
        assert_eq!(
            err.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        );
    }

    #[tokio::test]
    async fn into_response_forbidden() {
        let (status, body) = response_parts(AppError::Forbidden("nope".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.error.code, "FORBIDDEN");
        assert!(body.error.message.contains("nope"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert_eq!(body.error.message, "An internal error occurred");
    }
}
