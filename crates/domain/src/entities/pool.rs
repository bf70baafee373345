use crate::error::{DomainError, DomainResult};
use crate::math::constant_product::{SwapQuote, calculate_out_amount};
use crate::token::TokenAmount;
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pool identifier: canonical (lexicographic) token pair plus fee tier,
/// e.g. `BEE:SWAP.HIVE:30`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolId(pub String);

impl PoolId {
    pub fn new(token_x: &str, token_y: &str, fee_bps: u32) -> Self {
        let (a, b) = canonical_pair(token_x, token_y);
        Self(format!("{a}:{b}:{fee_bps}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orders two symbols lexicographically.
pub fn canonical_pair<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y { (x, y) } else { (y, x) }
}

/// Which side of a pool a token sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolSide {
    A,
    B,
}

/// A constant product liquidity pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub token_a: String,
    pub token_b: String,
    pub fee_bps: u32,
    pub reserve_a: TokenAmount,
    pub reserve_b: TokenAmount,
    pub total_shares: TokenAmount,
    #[serde(with = "crate::serde_u256")]
    pub fee_growth_global_a: U256,
    #[serde(with = "crate::serde_u256")]
    pub fee_growth_global_b: U256,
    /// Lifetime fees charged in token A.
    pub total_fees_a: TokenAmount,
    /// Lifetime fees charged in token B.
    pub total_fees_b: TokenAmount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pool {
    /// Creates an empty pool; the token order is canonicalized.
    pub fn new(token_x: &str, token_y: &str, fee_bps: u32, now: DateTime<Utc>) -> Self {
        let (a, b) = canonical_pair(token_x, token_y);
        Self {
            id: PoolId::new(a, b, fee_bps),
            token_a: a.to_string(),
            token_b: b.to_string(),
            fee_bps,
            reserve_a: TokenAmount::zero(),
            reserve_b: TokenAmount::zero(),
            total_shares: TokenAmount::zero(),
            fee_growth_global_a: U256::zero(),
            fee_growth_global_b: U256::zero(),
            total_fees_a: TokenAmount::zero(),
            total_fees_b: TokenAmount::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn has_liquidity(&self) -> bool {
        !self.total_shares.is_zero() && !self.reserve_a.is_zero() && !self.reserve_b.is_zero()
    }

    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.token_a == symbol || self.token_b == symbol
    }

    #[must_use]
    pub fn side_of(&self, symbol: &str) -> Option<PoolSide> {
        if self.token_a == symbol {
            Some(PoolSide::A)
        } else if self.token_b == symbol {
            Some(PoolSide::B)
        } else {
            None
        }
    }

    /// The counterpart of `symbol` in this pool.
    #[must_use]
    pub fn other_token(&self, symbol: &str) -> Option<&str> {
        match self.side_of(symbol)? {
            PoolSide::A => Some(&self.token_b),
            PoolSide::B => Some(&self.token_a),
        }
    }

    /// `(reserve_in, reserve_out)` when selling `token_in`.
    #[must_use]
    pub fn reserves_for(&self, token_in: &str) -> Option<(TokenAmount, TokenAmount)> {
        match self.side_of(token_in)? {
            PoolSide::A => Some((self.reserve_a, self.reserve_b)),
            PoolSide::B => Some((self.reserve_b, self.reserve_a)),
        }
    }

    /// Prices selling `amount_in` of `token_in` against the live reserves.
    ///
    /// # Errors
    /// [`DomainError::InvalidState`] if the token is not in the pool.
    pub fn quote(&self, token_in: &str, amount_in: TokenAmount) -> DomainResult<SwapQuote> {
        let (reserve_in, reserve_out) = self.reserves_for(token_in).ok_or_else(|| {
            DomainError::InvalidState(format!("{token_in} is not traded in pool {}", self.id))
        })?;
        calculate_out_amount(amount_in, reserve_in, reserve_out, self.fee_bps)
    }
}
