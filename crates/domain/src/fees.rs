//! Fee-per-share accumulator math.
//!
//! Each swap adds `fee * FEE_GROWTH_SCALE / total_shares` to the pool's
//! global accumulator for the token the fee was charged in. A position owns
//! `(global - entry) * shares / FEE_GROWTH_SCALE` of the fees accrued since
//! its last checkpoint. Both divisions round down, so providers can only
//! ever be owed less than the pool collected, never more.

use crate::error::{DomainError, DomainResult};
use crate::math::fixed_point::mul_div;
use crate::token::TokenAmount;
use primitive_types::U256;

/// Precision of the fee growth accumulators (`10^18`).
pub fn fee_growth_scale() -> U256 {
    U256::exp10(18)
}

/// Accumulator increase for a fee charged against `total_shares`.
/// Returns zero when no shares are outstanding.
///
/// # Errors
/// Arithmetic errors only.
pub fn fee_growth_delta(fee: TokenAmount, total_shares: TokenAmount) -> DomainResult<U256> {
    if total_shares.is_zero() || fee.is_zero() {
        return Ok(U256::zero());
    }
    mul_div(fee.0, fee_growth_scale(), total_shares.0)
}

/// Fees accrued to `shares` between two accumulator readings.
///
/// # Errors
/// [`DomainError::Underflow`] if `entry` is ahead of `global`.
pub fn accrued_fees(global: U256, entry: U256, shares: TokenAmount) -> DomainResult<TokenAmount> {
    let growth = global
        .checked_sub(entry)
        .ok_or(DomainError::Underflow("fee growth entry ahead of global"))?;
    if growth.is_zero() || shares.is_zero() {
        return Ok(TokenAmount::zero());
    }
    mul_div(growth, shares.0, fee_growth_scale()).map(TokenAmount)
}
