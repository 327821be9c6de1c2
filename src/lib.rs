//! simple_bank Library
//!
//! Re-exports modules for the server binary, the load-test tool and
//! integration tests.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod store;

pub use config::Config;
pub use domain::{Amount, AmountError, Currency, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse};
pub use store::{Store, StoreError, TransferTxParams, TransferTxResult};
