//! Amount type
//!
//! Domain primitive for transfer amounts, expressed in minor currency units
//! (cents). Amounts are validated at construction time, so a non-positive
//! amount can never reach the transfer operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount represents a validated, strictly positive monetary value.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Negating it never overflows, so it can always be applied as a debit
///
/// # Example
/// ```
/// use simple_bank::domain::Amount;
///
/// let amount = Amount::new(250).unwrap();
/// assert_eq!(amount.value(), 250);
/// assert_eq!(amount.as_debit(), -250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

/// Errors that can occur when creating an Amount
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(i64),

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    pub fn new(value: i64) -> Result<Self, AmountError> {
        if value <= 0 {
            return Err(AmountError::NotPositive(value));
        }
        Ok(Self(value))
    }

    /// Get the underlying value in minor units.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Signed delta applied to the account being debited.
    pub fn as_debit(&self) -> i64 {
        -self.0
    }

    /// Signed delta applied to the account being credited.
    pub fn as_credit(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(value)
    }
}

impl TryFrom<i64> for Amount {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
