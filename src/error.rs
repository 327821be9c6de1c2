//! Error handling module
//!
//! Centralized API error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::{AmountError, Currency, UnsupportedCurrency};
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    #[error(transparent)]
    UnsupportedCurrency(#[from] UnsupportedCurrency),

    #[error("Account {account_id} currency mismatch: {found} vs {expected}")]
    CurrencyMismatch {
        account_id: i64,
        expected: Currency,
        found: Currency,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(i64),

    // Store errors
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::InvalidAmount(err) => {
                (StatusCode::BAD_REQUEST, "invalid_amount", Some(err.to_string()))
            }
            AppError::UnsupportedCurrency(err) => {
                (StatusCode::BAD_REQUEST, "unsupported_currency", Some(err.0.clone()))
            }
            AppError::CurrencyMismatch { account_id, .. } => {
                (StatusCode::BAD_REQUEST, "currency_mismatch", Some(account_id.to_string()))
            }

            // 404 Not Found
            AppError::AccountNotFound(id) => {
                (StatusCode::NOT_FOUND, "account_not_found", Some(id.to_string()))
            }

            AppError::Store(store_err) => match store_err {
                StoreError::NotFound(what) => (StatusCode::NOT_FOUND, "not_found", Some(what.clone())),
                StoreError::InvalidArgument(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_argument", Some(msg.clone()))
                }
                StoreError::ConstraintViolation(msg) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "constraint_violation", Some(msg.clone()))
                }
                StoreError::Unavailable(msg) => {
                    tracing::error!("Storage unavailable: {}", msg);
                    (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", None)
                }
                StoreError::Internal(msg) => {
                    tracing::error!("Store error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        // Keep server-side details out of 5xx bodies
        let error = if status.is_server_error() {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
