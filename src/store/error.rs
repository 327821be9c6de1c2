//! Store Errors
//!
//! Error taxonomy for store operations. Every `sqlx::Error` is classified into
//! the most specific kind so callers can decide how to react.

/// SQLSTATE codes the store distinguishes.
mod sqlstate {
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const CHECK_VIOLATION: &str = "23514";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    /// A BIGINT column (balance, amount) would leave its range
    pub const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";
    pub const SERIALIZATION_FAILURE: &str = "40001";
    pub const DEADLOCK_DETECTED: &str = "40P01";
    /// Class 08: connection exception
    pub const CONNECTION_EXCEPTION_CLASS: &str = "08";
    /// Class 57: operator intervention (admin shutdown, cancelled query)
    pub const OPERATOR_INTERVENTION_CLASS: &str = "57";
}

/// Errors that can occur in the store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced row (usually an account) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller passed arguments the operation does not accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A storage-level constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The database or the transaction could not be reached or committed
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Anything else (decode errors, unexpected SQL errors)
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Check if this error is a missing-row error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Check if the caller may retry the whole operation
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                classify_sqlstate(&code, message)
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Internal(other.to_string()),
        }
    }
}

fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        sqlstate::FOREIGN_KEY_VIOLATION => StoreError::NotFound(message),
        sqlstate::UNIQUE_VIOLATION
        | sqlstate::CHECK_VIOLATION
        | sqlstate::NOT_NULL_VIOLATION
        | sqlstate::NUMERIC_VALUE_OUT_OF_RANGE => StoreError::ConstraintViolation(message),
        sqlstate::SERIALIZATION_FAILURE | sqlstate::DEADLOCK_DETECTED => {
            StoreError::Unavailable(message)
        }
        c if c.starts_with(sqlstate::CONNECTION_EXCEPTION_CLASS)
            || c.starts_with(sqlstate::OPERATOR_INTERVENTION_CLASS) =>
        {
            StoreError::Unavailable(message)
        }
        _ => StoreError::Internal(message),
    }
}
