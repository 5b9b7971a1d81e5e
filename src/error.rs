//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! The authorization endpoint never uses this conversion: it collapses
//! every failure to the generic `"07"` response code after logging the
//! concrete variant, so internal causes never leak to terminals. The
//! merchant and account endpoints use the mapping below.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// Each variant keeps one failure kind of the authorization pipeline
/// distinct for logging and tests, even where the external surface
/// collapses them.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No balance row exists for the requested account.
    #[error("Account not found")]
    AccountNotFound,

    /// The exclusive claim on the account's balance row could not be
    /// acquired within the bounded wait. Never retried internally; the
    /// caller may resubmit with the same idempotency key.
    #[error("Timed out waiting for the account balance lock")]
    LockTimeout,

    /// A transaction with this idempotency key was already committed.
    /// The original outcome is not re-derived; callers look it up via the
    /// transaction listing.
    #[error("Idempotency key already used")]
    DuplicateIdempotencyKey,

    /// The balance row changed between fetch and commit. With the
    /// mandatory exclusive fetch this indicates a misuse of the store,
    /// not an expected race.
    #[error("Balance row was modified concurrently")]
    StaleBalance,

    /// A merchant with the same normalized name is already registered.
    #[error("Merchant already exists")]
    MerchantAlreadyExists,

    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Status Code Mapping
///
/// - `AccountNotFound` → 404 Not Found
/// - `MerchantAlreadyExists` → 409 Conflict
/// - `InvalidRequest` → 400 Bad Request
/// - everything else → 500 Internal Server Error (hides details)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::MerchantAlreadyExists => {
                (StatusCode::CONFLICT, "merchant_exists", self.to_string())
            }
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(_)
            | AppError::LockTimeout
            | AppError::DuplicateIdempotencyKey
            | AppError::StaleBalance => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
