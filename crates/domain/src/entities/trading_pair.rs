use crate::enums::{OrderSide, OrderType, PairStatus};
use crate::error::{DomainError, DomainResult};
use crate::math::fixed_point::{mul_div, pow10};
use crate::token::TokenAmount;
use crate::value_objects::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pair identifier, `BASE/QUOTE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub String);

impl PairId {
    pub fn new(base: &str, quote: &str) -> Self {
        Self(format!("{base}/{quote}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An order-book market. Prices are raw quote units per whole base token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPair {
    pub id: PairId,
    pub base: String,
    pub quote: String,
    pub base_decimals: u8,
    pub tick_size: Price,
    pub lot_size: TokenAmount,
    pub min_notional: TokenAmount,
    pub status: PairStatus,
    pub created_at: DateTime<Utc>,
}

impl TradingPair {
    /// # Errors
    /// [`DomainError::InvalidOrder`] for zero tick or lot sizes or identical
    /// symbols.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base: &str,
        quote: &str,
        base_decimals: u8,
        tick_size: Price,
        lot_size: TokenAmount,
        min_notional: TokenAmount,
        status: PairStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if base == quote {
            return Err(DomainError::InvalidOrder(
                "base and quote must differ".to_string(),
            ));
        }
        if tick_size.is_zero() || lot_size.is_zero() {
            return Err(DomainError::InvalidOrder(
                "tick size and lot size must be positive".to_string(),
            ));
        }
        pow10(base_decimals)?;
        Ok(Self {
            id: PairId::new(base, quote),
            base: base.to_string(),
            quote: quote.to_string(),
            base_decimals,
            tick_size,
            lot_size,
            min_notional,
            status,
            created_at: now,
        })
    }

    #[must_use]
    pub fn is_trading(&self) -> bool {
        self.status == PairStatus::Trading
    }

    /// Order side for a taker selling `token_in` to receive `token_out`.
    #[must_use]
    pub fn side_for(&self, token_in: &str, token_out: &str) -> Option<OrderSide> {
        if token_in == self.quote && token_out == self.base {
            Some(OrderSide::Buy)
        } else if token_in == self.base && token_out == self.quote {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }

    /// Quote value of `quantity` base units at `price`, rounded down.
    ///
    /// # Errors
    /// Arithmetic errors only.
    pub fn notional(&self, quantity: TokenAmount, price: Price) -> DomainResult<TokenAmount> {
        mul_div(quantity.0, price.0, pow10(self.base_decimals)?).map(TokenAmount)
    }

    /// Largest lot-aligned base quantity whose notional at `price` fits in
    /// `budget` quote units.
    ///
    /// # Errors
    /// [`DomainError::DivisionByZero`] for a zero price.
    pub fn affordable_quantity(&self, budget: TokenAmount, price: Price) -> DomainResult<TokenAmount> {
        let raw = mul_div(budget.0, pow10(self.base_decimals)?, price.0)?;
        Ok(self.align_to_lot(TokenAmount(raw)))
    }

    /// Rounds a quantity down to a multiple of the lot size.
    #[must_use]
    pub fn align_to_lot(&self, quantity: TokenAmount) -> TokenAmount {
        if self.lot_size.is_zero() {
            return quantity;
        }
        TokenAmount(quantity.0 - quantity.0 % self.lot_size.0)
    }

    /// Checks tick, lot and notional constraints before an order enters the book.
    ///
    /// # Errors
    /// [`DomainError::InvalidOrder`] describing the violated rule.
    pub fn validate_order(
        &self,
        order_type: OrderType,
        price: Option<Price>,
        quantity: TokenAmount,
    ) -> DomainResult<()> {
        let reject = |msg: String| Err(DomainError::InvalidOrder(msg));
        if quantity.is_zero() {
            return reject("quantity must be positive".to_string());
        }
        if !(quantity.0 % self.lot_size.0).is_zero() {
            return reject(format!(
                "quantity {quantity} is not a multiple of lot size {}",
                self.lot_size
            ));
        }
        match (order_type, price) {
            (OrderType::Limit, None) => reject("limit orders require a price".to_string()),
            (OrderType::Limit, Some(price)) => {
                if price.is_zero() {
                    return reject("price must be positive".to_string());
                }
                if !(price.0 % self.tick_size.0).is_zero() {
                    return reject(format!(
                        "price {price} is not a multiple of tick size {}",
                        self.tick_size
                    ));
                }
                let notional = self.notional(quantity, price)?;
                if notional < self.min_notional {
                    return reject(format!(
                        "notional {notional} is below the minimum {}",
                        self.min_notional
                    ));
                }
                Ok(())
            }
            (OrderType::Market, Some(_)) => {
                reject("market orders must not carry a price".to_string())
            }
            (OrderType::Market, None) => Ok(()),
        }
    }
}
