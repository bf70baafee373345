//! Constant product (`x * y = k`) pool math.
//!
//! Fees are taken from the input before pricing and stay in the pool:
//!
//! ```text
//! fee        = floor(amount_in * fee_bps / 10_000)
//! net_input  = amount_in - fee
//! amount_out = floor(net_input * reserve_out / (reserve_in + net_input))
//! ```

use crate::error::{DomainError, DomainResult};
use crate::math::fixed_point::{mul_div, mul_div_ceil, sqrt_product};
use crate::token::TokenAmount;
use crate::value_objects::BPS_DENOMINATOR;
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};

/// Result of pricing an exact-in swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub amount_in: TokenAmount,
    pub fee: TokenAmount,
    pub amount_out: TokenAmount,
}

impl SwapQuote {
    fn empty(amount_in: TokenAmount) -> Self {
        Self {
            amount_in,
            fee: TokenAmount::zero(),
            amount_out: TokenAmount::zero(),
        }
    }
}

/// Prices an exact-in swap. Quoting and execution both go through here so a
/// quote is always achievable against the same reserves.
///
/// A zero input or an empty reserve yields a zero output rather than an error.
///
/// # Errors
/// [`DomainError::InvalidPercentage`] if `fee_bps` exceeds 100%, or an
/// arithmetic error on overflow.
pub fn calculate_out_amount(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> DomainResult<SwapQuote> {
    if fee_bps > BPS_DENOMINATOR {
        return Err(DomainError::InvalidPercentage(format!(
            "fee of {fee_bps} bps exceeds 100%"
        )));
    }
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(SwapQuote::empty(amount_in));
    }

    let fee = mul_div(amount_in.0, U256::from(fee_bps), U256::from(BPS_DENOMINATOR))?;
    let net_input = amount_in.0 - fee;
    let denominator = reserve_in
        .0
        .checked_add(net_input)
        .ok_or(DomainError::Overflow("reserve_in + net_input"))?;
    let amount_out = mul_div(net_input, reserve_out.0, denominator)?;

    Ok(SwapQuote {
        amount_in,
        fee: TokenAmount(fee),
        amount_out: TokenAmount(amount_out),
    })
}

/// Output at the current spot price, net of the pool fee and without price
/// impact. Used as the reference point for slippage.
///
/// # Errors
/// Arithmetic errors only; empty reserves yield zero.
pub fn calculate_spot_out_amount(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
    reserve_out: TokenAmount,
    fee_bps: u32,
) -> DomainResult<TokenAmount> {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return Ok(TokenAmount::zero());
    }
    let fee = mul_div(amount_in.0, U256::from(fee_bps), U256::from(BPS_DENOMINATOR))?;
    let net_input = amount_in.0.saturating_sub(fee);
    mul_div(net_input, reserve_out.0, reserve_in.0).map(TokenAmount)
}

/// Cheap upper bound of the price impact in basis points:
/// `10_000 * amount_in / (reserve_in + amount_in)`.
///
/// # Errors
/// Arithmetic errors only.
pub fn calculate_price_impact_bps(
    amount_in: TokenAmount,
    reserve_in: TokenAmount,
) -> DomainResult<u32> {
    let denominator = reserve_in
        .0
        .checked_add(amount_in.0)
        .ok_or(DomainError::Overflow("reserve_in + amount_in"))?;
    if denominator.is_zero() {
        return Ok(0);
    }
    let bps = mul_div(amount_in.0, U256::from(BPS_DENOMINATOR), denominator)?;
    // bounded by BPS_DENOMINATOR
    Ok(bps.low_u32())
}

/// Calculates the constant product K.
pub fn calculate_k(reserve0: TokenAmount, reserve1: TokenAmount) -> U512 {
    reserve0.0.full_mul(reserve1.0)
}

/// Shares minted and token amounts taken by a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositPlan {
    pub shares: TokenAmount,
    pub amount_a: TokenAmount,
    pub amount_b: TokenAmount,
}

/// Plans a liquidity deposit.
///
/// The first deposit (no outstanding shares) sets the price ratio and mints
/// `sqrt(amount_a * amount_b)` shares. Later deposits mint
/// `min(amount_a * S / Ra, amount_b * S / Rb)` shares and only take the
/// amounts matching the current ratio; the excess of the other token stays
/// with the provider.
///
/// # Errors
/// [`DomainError::InvalidAmount`] if the deposit is too small to mint a share.
pub fn plan_deposit(
    amount_a: TokenAmount,
    amount_b: TokenAmount,
    reserve_a: TokenAmount,
    reserve_b: TokenAmount,
    total_shares: TokenAmount,
) -> DomainResult<DepositPlan> {
    let too_small = || DomainError::InvalidAmount {
        input: format!("{amount_a}/{amount_b}"),
        reason: "deposit too small to mint shares",
    };
    if amount_a.is_zero() || amount_b.is_zero() {
        return Err(too_small());
    }

    if total_shares.is_zero() || reserve_a.is_zero() || reserve_b.is_zero() {
        let shares = sqrt_product(amount_a.0, amount_b.0)?;
        if shares.is_zero() {
            return Err(too_small());
        }
        return Ok(DepositPlan {
            shares: TokenAmount(shares),
            amount_a,
            amount_b,
        });
    }

    let share_a = mul_div(amount_a.0, total_shares.0, reserve_a.0)?;
    let share_b = mul_div(amount_b.0, total_shares.0, reserve_b.0)?;

    let plan = if share_a <= share_b {
        let used_b = mul_div_ceil(amount_a.0, reserve_b.0, reserve_a.0)?.min(amount_b.0);
        DepositPlan {
            shares: TokenAmount(share_a),
            amount_a,
            amount_b: TokenAmount(used_b),
        }
    } else {
        let used_a = mul_div_ceil(amount_b.0, reserve_a.0, reserve_b.0)?.min(amount_a.0);
        DepositPlan {
            shares: TokenAmount(share_b),
            amount_a: TokenAmount(used_a),
            amount_b,
        }
    };
    if plan.shares.is_zero() {
        return Err(too_small());
    }
    Ok(plan)
}

/// Token amounts returned for burning `shares`, rounded down in favour of
/// the pool.
///
/// # Errors
/// [`DomainError::InvalidAmount`] when `shares` is zero or exceeds the total.
pub fn plan_withdrawal(
    shares: TokenAmount,
    reserve_a: TokenAmount,
    reserve_b: TokenAmount,
    total_shares: TokenAmount,
) -> DomainResult<(TokenAmount, TokenAmount)> {
    if shares.is_zero() || shares > total_shares {
        return Err(DomainError::InvalidAmount {
            input: shares.to_string(),
            reason: "share amount must be positive and at most the pool total",
        });
    }
    let out_a = mul_div(reserve_a.0, shares.0, total_shares.0)?;
    let out_b = mul_div(reserve_b.0, shares.0, total_shares.0)?;
    Ok((TokenAmount(out_a), TokenAmount(out_b)))
}
