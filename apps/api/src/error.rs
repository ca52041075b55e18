//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Marketplace API                    │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /purchase                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler                                                         │  │
//! │  │  Result<Json<T>, ApiError>                                       │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Bad parameter? ──── ValidationError ───────────────┐           │  │
//! │  │         │                                           │           │  │
//! │  │         ▼                                           ▼           │  │
//! │  │  Database Error? ─── DbError::NotFound { .. } ─── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Domain rejection? ─ CoreError::InsufficientFunds ──┘           │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄────────────────────────────────────────────────────────────────────  │
//! │                                                                         │
//! │  HTTP 400                                                               │
//! │  { "code": "INSUFFICIENT_FUNDS",                                        │
//! │    "message": "Insufficient funds: required $50.00, available $10.00" } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal causes (SQL errors, failed commits) are logged here and replaced
//! by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use pharmacy_core::{CoreError, ValidationError};
use pharmacy_db::DbError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error returned from handlers.
///
/// ## Serialization
/// This is the body a client receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "pharmacy not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Buyer cannot afford the mask (400)
    InsufficientFunds,

    /// Purchase rolled back (500)
    TransactionFailed,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status for this code.
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError | ErrorCode::InsufficientFunds => StatusCode::BAD_REQUEST,
            ErrorCode::TransactionFailed | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::validation(format!(
                "{field} '{value}' already exists"
            )),
            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::TransactionFailed(e) => {
                error!("Transaction failed: {}", e);
                ApiError::new(
                    ErrorCode::TransactionFailed,
                    "Transaction failed and was rolled back",
                )
            }
            DbError::ConnectionFailed(e) => {
                error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database is busy")
            }
            DbError::Internal(e) => {
                error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::Internal, "Internal server error")
            }
            DbError::Rejected(e) => e.into(),
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ CoreError::InsufficientFunds { .. } => {
                ApiError::new(ErrorCode::InsufficientFunds, e.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pharmacy_core::Money;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::ValidationError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InsufficientFunds.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::TransactionFailed.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_keeps_entity_kind() {
        let err: ApiError = DbError::not_found("mask_price", "1/2").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "mask_price not found: 1/2");
    }

    #[test]
    fn test_rejected_purchase_is_insufficient_funds() {
        let err: ApiError = DbError::Rejected(CoreError::InsufficientFunds {
            required: Money::from_cents(5_000),
            available: Money::from_cents(1_000),
        })
        .into();

        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert!(err.message.contains("$50.00"));
    }

    #[test]
    fn test_internal_causes_are_hidden() {
        let err: ApiError = DbError::TransactionFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code, ErrorCode::TransactionFailed);
        assert!(!err.message.contains("disk"));

        let err: ApiError = DbError::QueryFailed("no such column: foo".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("foo"));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ApiError::validation("limit must be between 1 and 100"))
            .unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "limit must be between 1 and 100");
    }
}
