//! Domain module
//!
//! Core domain types shared by the store and the API layer.

pub mod amount;
pub mod context;
pub mod currency;

pub use amount::{Amount, AmountError};
pub use context::OperationContext;
pub use currency::{is_supported_currency, Currency, UnsupportedCurrency};
