//! Swap fee accrual and per-position fee settlement.
//!
//! Fees stay inside the pool reserves. The accumulators only track who is
//! owed what; claiming is a checkpoint that moves the owed amount into the
//! position's `collected` counters.

use crate::error::EngineResult;
use hybrid_dex_domain::entities::{LiquidityPosition, Pool, PoolSide};
use hybrid_dex_domain::error::DomainError;
use hybrid_dex_domain::fees::{accrued_fees, fee_growth_delta};
use hybrid_dex_domain::token::TokenAmount;
use tracing::debug;

/// Credits a swap fee charged in `side`'s token to all current shares.
///
/// # Errors
/// Arithmetic errors only.
pub fn accrue_swap_fee(pool: &mut Pool, side: PoolSide, fee: TokenAmount) -> EngineResult<()> {
    if fee.is_zero() {
        return Ok(());
    }
    let delta = fee_growth_delta(fee, pool.total_shares)?;
    match side {
        PoolSide::A => {
            pool.fee_growth_global_a = pool
                .fee_growth_global_a
                .checked_add(delta)
                .ok_or(DomainError::Overflow("fee growth a"))?;
            pool.total_fees_a = pool.total_fees_a.checked_add(fee)?;
        }
        PoolSide::B => {
            pool.fee_growth_global_b = pool
                .fee_growth_global_b
                .checked_add(delta)
                .ok_or(DomainError::Overflow("fee growth b"))?;
            pool.total_fees_b = pool.total_fees_b.checked_add(fee)?;
        }
    }
    debug!(pool = %pool.id, fee = %fee, "Fee accrued");
    Ok(())
}

/// Fees owed to `position` right now: settled but unclaimed plus anything
/// accrued since its last checkpoint.
///
/// # Errors
/// Arithmetic errors only.
pub fn claimable_fees(
    pool: &Pool,
    position: &LiquidityPosition,
) -> EngineResult<(TokenAmount, TokenAmount)> {
    let (pending_a, pending_b) = pending_fees(pool, position)?;
    Ok((
        position.unclaimed_fees_a.checked_add(pending_a)?,
        position.unclaimed_fees_b.checked_add(pending_b)?,
    ))
}

/// Moves accrued fees into `unclaimed` and re-checkpoints the position.
///
/// Must run before every change of the position's share balance.
///
/// # Errors
/// Arithmetic errors only.
pub fn settle_position(pool: &Pool, position: &mut LiquidityPosition) -> EngineResult<()> {
    let (pending_a, pending_b) = pending_fees(pool, position)?;
    position.unclaimed_fees_a = position.unclaimed_fees_a.checked_add(pending_a)?;
    position.unclaimed_fees_b = position.unclaimed_fees_b.checked_add(pending_b)?;
    position.fee_growth_entry_a = pool.fee_growth_global_a;
    position.fee_growth_entry_b = pool.fee_growth_global_b;
    Ok(())
}

/// Settles, then checkpoints everything owed as collected.
///
/// # Errors
/// Arithmetic errors only.
pub fn claim(pool: &Pool, position: &mut LiquidityPosition) -> EngineResult<(TokenAmount, TokenAmount)> {
    settle_position(pool, position)?;
    let claimed_a = std::mem::take(&mut position.unclaimed_fees_a);
    let claimed_b = std::mem::take(&mut position.unclaimed_fees_b);
    position.collected_fees_a = position.collected_fees_a.checked_add(claimed_a)?;
    position.collected_fees_b = position.collected_fees_b.checked_add(claimed_b)?;
    Ok((claimed_a, claimed_b))
}

fn pending_fees(pool: &Pool, position: &LiquidityPosition) -> EngineResult<(TokenAmount, TokenAmount)> {
    let a = accrued_fees(
        pool.fee_growth_global_a,
        position.fee_growth_entry_a,
        position.share_balance,
    )?;
    let b = accrued_fees(
        pool.fee_growth_global_b,
        position.fee_growth_entry_b,
        position.share_balance,
    )?;
    Ok((a, b))
}
