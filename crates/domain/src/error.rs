//! Domain error types.

use crate::token::TokenAmount;

/// Errors raised by domain value types, math and entity state transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Arithmetic result does not fit in 256 bits.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),
    /// Subtraction would produce a negative value.
    #[error("arithmetic underflow: {0}")]
    Underflow(&'static str),
    /// Division with a zero denominator.
    #[error("division by zero")]
    DivisionByZero,
    /// A decimal string could not be parsed into raw units.
    #[error("invalid amount '{input}': {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },
    /// Token symbol does not follow the naming rules.
    #[error("invalid token symbol '{0}'")]
    InvalidSymbol(String),
    /// Token decimal count outside the supported range.
    #[error("invalid decimal count {0}")]
    InvalidDecimals(u8),
    /// Percentage outside `0..=100` or otherwise malformed.
    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),
    /// An order violates the trading pair's rules.
    #[error("invalid order: {0}")]
    InvalidOrder(String),
    /// A state transition is not allowed from the current state.
    #[error("invalid state transition: {0}")]
    InvalidState(String),
    /// The balance ledger cannot cover a debit.
    #[error("insufficient {symbol} balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        /// Debited account.
        account: String,
        /// Token symbol.
        symbol: String,
        /// Requested debit.
        required: TokenAmount,
        /// Balance at the time of the debit.
        available: TokenAmount,
    },
}

/// Convenience alias used across the domain crate.
pub type DomainResult<T> = Result<T, DomainError>;
