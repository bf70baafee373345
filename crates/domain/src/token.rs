//! Token metadata and raw token amounts.

use crate::error::{DomainError, DomainResult};
use crate::serde_u256::parse_decimal;
use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Identity of an account on the outer ledger.
pub type AccountId = String;

/// Largest decimal count a token may declare.
pub const MAX_DECIMALS: u8 = 18;

/// A registered token. The decimal count is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub symbol: String,
    pub issuer: AccountId,
    pub decimals: u8,
    /// Total raw units ever issued.
    pub supply: TokenAmount,
}

impl Token {
    /// Creates a token after validating the symbol and decimal count.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidDecimals`] above [`MAX_DECIMALS`] and
    /// [`DomainError::InvalidSymbol`] for a malformed symbol.
    pub fn new(
        symbol: impl Into<String>,
        issuer: impl Into<AccountId>,
        decimals: u8,
    ) -> DomainResult<Self> {
        let symbol = symbol.into();
        if !is_valid_symbol(&symbol) {
            return Err(DomainError::InvalidSymbol(symbol));
        }
        if decimals > MAX_DECIMALS {
            return Err(DomainError::InvalidDecimals(decimals));
        }
        Ok(Self {
            symbol,
            issuer: issuer.into(),
            decimals,
            supply: TokenAmount::zero(),
        })
    }
}

/// Symbols are 1..=10 characters of `A-Z`, `0-9` and `.`, starting with a letter.
#[must_use]
pub fn is_valid_symbol(symbol: &str) -> bool {
    let bytes = symbol.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 10
        && bytes[0].is_ascii_uppercase()
        && bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'.')
}

/// A non-negative amount in a token's smallest unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(pub U256);

impl TokenAmount {
    pub fn new(amount: impl Into<U256>) -> Self {
        Self(amount.into())
    }

    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// # Errors
    /// Returns [`DomainError::Overflow`] past `2^256 - 1`.
    pub fn checked_add(self, rhs: Self) -> DomainResult<Self> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(DomainError::Overflow("token amount addition"))
    }

    /// # Errors
    /// Returns [`DomainError::Underflow`] when `rhs > self`.
    pub fn checked_sub(self, rhs: Self) -> DomainResult<Self> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or(DomainError::Underflow("token amount subtraction"))
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl From<u64> for TokenAmount {
    fn from(v: u64) -> Self {
        Self(U256::from(v))
    }
}

impl From<u128> for TokenAmount {
    fn from(v: u128) -> Self {
        Self(U256::from(v))
    }
}

impl From<U256> for TokenAmount {
    fn from(v: U256) -> Self {
        Self(v)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_decimal(s).map(Self).ok_or_else(|| DomainError::InvalidAmount {
            input: s.to_string(),
            reason: "expected a non-negative decimal integer",
        })
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::serde_u256::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        crate::serde_u256::deserialize(deserializer).map(Self)
    }
}
