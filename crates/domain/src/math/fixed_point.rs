//! Exact fixed-point helpers over `U256`.
//!
//! Every division truncates toward zero. Products are widened to `U512`
//! before dividing so `a * b / c` never overflows in the intermediate step.

use crate::error::{DomainError, DomainResult};
use crate::token::{MAX_DECIMALS, TokenAmount};
use primitive_types::{U256, U512};

/// Returns `10^decimals`.
///
/// # Errors
/// Returns [`DomainError::InvalidDecimals`] above [`MAX_DECIMALS`].
pub fn pow10(decimals: u8) -> DomainResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(DomainError::InvalidDecimals(decimals));
    }
    Ok(U256::exp10(usize::from(decimals)))
}

/// `floor(a * b / denominator)`.
///
/// # Errors
/// [`DomainError::DivisionByZero`] for a zero denominator,
/// [`DomainError::Overflow`] when the quotient exceeds 256 bits.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> DomainResult<U256> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let quotient = a.full_mul(b) / U512::from(denominator);
    U256::try_from(quotient).map_err(|_| DomainError::Overflow("mul_div quotient"))
}

/// `ceil(a * b / denominator)`.
///
/// # Errors
/// Same as [`mul_div`].
pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> DomainResult<U256> {
    if denominator.is_zero() {
        return Err(DomainError::DivisionByZero);
    }
    let product = a.full_mul(b);
    let denominator = U512::from(denominator);
    let (quotient, remainder) = product.div_mod(denominator);
    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient + U512::one()
    };
    U256::try_from(quotient).map_err(|_| DomainError::Overflow("mul_div_ceil quotient"))
}

/// Integer square root of `a * b`, computed without overflow.
///
/// # Errors
/// Never fails in practice; the root of a 512-bit value fits in 256 bits.
pub fn sqrt_product(a: U256, b: U256) -> DomainResult<U256> {
    let root = a.full_mul(b).integer_sqrt();
    U256::try_from(root).map_err(|_| DomainError::Overflow("sqrt_product"))
}

/// Converts a human decimal string (`"12.5"`) into raw units for a token
/// with `decimals` fractional digits.
///
/// # Errors
/// [`DomainError::InvalidAmount`] for signs, exponents, stray characters or
/// more fractional digits than the token supports.
pub fn parse_amount(human: &str, decimals: u8) -> DomainResult<TokenAmount> {
    let invalid = |reason: &'static str| DomainError::InvalidAmount {
        input: human.to_string(),
        reason,
    };
    let scale = pow10(decimals)?;
    let (whole, fraction) = match human.split_once('.') {
        Some((w, f)) => (w, f),
        None => (human, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("empty amount"));
    }
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(fraction) {
        return Err(invalid("only digits and a single '.' are allowed"));
    }
    if fraction.len() > usize::from(decimals) {
        return Err(invalid("more fractional digits than the token precision"));
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| invalid("whole part too large"))?
    };
    let mut padded = fraction.to_string();
    padded.extend(std::iter::repeat_n('0', usize::from(decimals) - fraction.len()));
    let fraction = if padded.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(&padded).map_err(|_| invalid("fraction too large"))?
    };

    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(fraction))
        .map(TokenAmount)
        .ok_or(DomainError::Overflow("parse_amount"))
}

/// Formats raw units as a human decimal string, trimming trailing zeros.
///
/// # Errors
/// [`DomainError::InvalidDecimals`] above [`MAX_DECIMALS`].
pub fn format_amount(raw: TokenAmount, decimals: u8) -> DomainResult<String> {
    let scale = pow10(decimals)?;
    let (whole, fraction) = raw.0.div_mod(scale);
    if fraction.is_zero() {
        return Ok(whole.to_string());
    }
    let fraction = format!("{:0>width$}", fraction.to_string(), width = usize::from(decimals));
    Ok(format!("{whole}.{}", fraction.trim_end_matches('0')))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.5", 3).unwrap(), TokenAmount::from(1500u64));
        assert_eq!(parse_amount("0.001", 3).unwrap(), TokenAmount::from(1u64));
        assert_eq!(parse_amount(".25", 2).unwrap(), TokenAmount::from(25u64));
        assert_eq!(parse_amount("7", 0).unwrap(), TokenAmount::from(7u64));
        assert_eq!(parse_amount("7.", 2).unwrap(), TokenAmount::from(700u64));
    }

    #[test]
    fn test_parse_amount_rejects_malformed() {
        assert!(parse_amount("1.2345", 3).is_err());
        assert!(parse_amount("-1", 3).is_err());
        assert!(parse_amount("1e3", 3).is_err());
        assert!(parse_amount("", 3).is_err());
        assert!(parse_amount(".", 3).is_err());
        assert!(parse_amount("1.2.3", 3).is_err());
        assert!(parse_amount("1", 19).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(TokenAmount::from(1500u64), 3).unwrap(), "1.5");
        assert_eq!(format_amount(TokenAmount::from(1u64), 3).unwrap(), "0.001");
        assert_eq!(format_amount(TokenAmount::from(2000u64), 3).unwrap(), "2");
        assert_eq!(format_amount(TokenAmount::from(42u64), 0).unwrap(), "42");
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        let max = U256::MAX;
        assert_eq!(mul_div(max, max, max).unwrap(), max);
        assert_eq!(mul_div(U256::from(7), U256::from(3), U256::from(2)).unwrap(), U256::from(10));
        assert_eq!(
            mul_div_ceil(U256::from(7), U256::from(3), U256::from(2)).unwrap(),
            U256::from(11)
        );
        assert_eq!(mul_div(U256::one(), U256::one(), U256::zero()), Err(DomainError::DivisionByZero));
        assert!(mul_div(max, max, U256::one()).is_err());
    }

    #[test]
    fn test_sqrt_product() {
        assert_eq!(
            sqrt_product(U256::from(1_000_000u64), U256::from(4_000_000u64)).unwrap(),
            U256::from(2_000_000u64)
        );
        assert_eq!(sqrt_product(U256::from(2u64), U256::from(1u64)).unwrap(), U256::one());
    }
}
