use crate::entities::pool::PoolId;
use crate::token::{AccountId, TokenAmount};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A provider's stake in one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPosition {
    pub provider: AccountId,
    pub pool_id: PoolId,
    pub share_balance: TokenAmount,
    /// Accumulator readings at the last deposit, withdrawal or claim.
    #[serde(with = "crate::serde_u256")]
    pub fee_growth_entry_a: U256,
    #[serde(with = "crate::serde_u256")]
    pub fee_growth_entry_b: U256,
    /// Fees settled at a checkpoint but not yet claimed.
    pub unclaimed_fees_a: TokenAmount,
    pub unclaimed_fees_b: TokenAmount,
    /// Lifetime claimed fees.
    pub collected_fees_a: TokenAmount,
    pub collected_fees_b: TokenAmount,
    pub opened_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiquidityPosition {
    /// Opens an empty position checkpointed at the pool's current accumulators.
    pub fn new(
        provider: impl Into<AccountId>,
        pool_id: PoolId,
        fee_growth_a: U256,
        fee_growth_b: U256,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            provider: provider.into(),
            pool_id,
            share_balance: TokenAmount::zero(),
            fee_growth_entry_a: fee_growth_a,
            fee_growth_entry_b: fee_growth_b,
            unclaimed_fees_a: TokenAmount::zero(),
            unclaimed_fees_b: TokenAmount::zero(),
            collected_fees_a: TokenAmount::zero(),
            collected_fees_b: TokenAmount::zero(),
            opened_at: now,
            updated_at: now,
        }
    }

    /// Document-store key, `provider_poolId`.
    #[must_use]
    pub fn key(&self) -> String {
        position_key(&self.provider, &self.pool_id)
    }

    /// A position with no shares and nothing left to claim can be removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.share_balance.is_zero()
            && self.unclaimed_fees_a.is_zero()
            && self.unclaimed_fees_b.is_zero()
    }
}

pub fn position_key(provider: &str, pool_id: &PoolId) -> String {
    format!("{provider}_{pool_id}")
}
