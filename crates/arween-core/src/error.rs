//! Error types for arween-core.

use thiserror::Error;

use crate::Amount;

/// Errors that can occur in core balance and amount operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Invalid amount (malformed, negative, or too many decimals).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid rate (above 100%).
    #[error("invalid rate: {0}")]
    InvalidRate(String),

    /// A debit exceeds the balance it is drawn from.
    #[error("insufficient funds in {balance}: required {required}, available {available}")]
    InsufficientFunds {
        /// Name of the balance being debited.
        balance: &'static str,
        /// Amount the operation needed.
        required: Amount,
        /// Amount actually held.
        available: Amount,
    },

    /// A credit would overflow the balance.
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),
}
