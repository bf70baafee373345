use crate::error::{DomainError, DomainResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis-point denominator (10 000 = 100%).
pub const BPS_DENOMINATOR: u32 = 10_000;

/// An integer fraction in basis points, `0..=10_000`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BasisPoints(u32);

impl BasisPoints {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(BPS_DENOMINATOR);

    /// # Errors
    /// Returns [`DomainError::InvalidPercentage`] above 10 000.
    pub fn new(bps: u32) -> DomainResult<Self> {
        if bps > BPS_DENOMINATOR {
            return Err(DomainError::InvalidPercentage(format!(
                "{bps} bps exceeds 100%"
            )));
        }
        Ok(Self(bps))
    }

    /// Converts a percentage (e.g. `1.25` for 1.25%) into basis points,
    /// truncating anything finer than one basis point.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidPercentage`] for negative values or
    /// values above 100.
    pub fn from_percent(percent: Decimal) -> DomainResult<Self> {
        if percent.is_sign_negative() && !percent.is_zero() {
            return Err(DomainError::InvalidPercentage(format!(
                "{percent}% is negative"
            )));
        }
        let bps = percent
            .checked_mul(Decimal::ONE_HUNDRED)
            .map(|v| v.trunc())
            .and_then(|v| v.to_u32())
            .ok_or_else(|| DomainError::InvalidPercentage(format!("{percent}% out of range")))?;
        Self::new(bps)
    }

    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Human-readable percentage (`30` bps → `0.30`).
    #[must_use]
    pub fn to_percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_percent() {
        assert_eq!(BasisPoints::from_percent(dec!(1.0)).unwrap().get(), 100);
        assert_eq!(BasisPoints::from_percent(dec!(0.3)).unwrap().get(), 30);
        assert_eq!(BasisPoints::from_percent(dec!(0.015)).unwrap().get(), 1);
        assert_eq!(BasisPoints::from_percent(dec!(100)).unwrap().get(), 10_000);
        assert!(BasisPoints::from_percent(dec!(100.01)).is_err());
        assert!(BasisPoints::from_percent(dec!(-1)).is_err());
    }

    #[test]
    fn test_to_percent() {
        let bps = BasisPoints::new(30).unwrap();
        assert_eq!(bps.to_percent(), dec!(0.30));
    }
}
