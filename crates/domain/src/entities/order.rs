use crate::entities::trading_pair::PairId;
use crate::enums::{OrderSide, OrderStatus, OrderType};
use crate::error::{DomainError, DomainResult};
use crate::token::{AccountId, TokenAmount};
use crate::value_objects::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace for ids derived from transaction ids.
const ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f2c_1d7e_98b4_4a53_a1e0_5c3b_7d9f_0e21);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Derives the id deterministically from the delivering transaction and
    /// a sequence number within it, so every replica assigns the same id.
    pub fn derive(tx_id: &str, seq: u32) -> Self {
        Self(derive_uuid("order", tx_id, seq))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn derive_uuid(kind: &str, tx_id: &str, seq: u32) -> Uuid {
    Uuid::new_v5(&ID_NAMESPACE, format!("{kind}:{tx_id}:{seq}").as_bytes())
}

/// An order on a trading pair. Quantities are raw base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub pair_id: PairId,
    pub owner: AccountId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Option<Price>,
    pub quantity: TokenAmount,
    pub filled_quantity: TokenAmount,
    pub remaining_quantity: TokenAmount,
    pub status: OrderStatus,
    /// Funds held for the unfilled part: base for SELL, quote for BUY.
    pub escrow: TokenAmount,
    /// Arrival order on the book, the time-priority key.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        pair_id: PairId,
        owner: impl Into<AccountId>,
        side: OrderSide,
        order_type: OrderType,
        price: Option<Price>,
        quantity: TokenAmount,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            pair_id,
            owner: owner.into(),
            side,
            order_type,
            price,
            quantity,
            filled_quantity: TokenAmount::zero(),
            remaining_quantity: quantity,
            status: OrderStatus::Open,
            escrow: TokenAmount::zero(),
            sequence: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Open or partially filled orders sit on the book.
    #[must_use]
    pub fn is_resting(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Open | OrderStatus::PartiallyFilled
        )
    }

    /// Records a fill of `quantity` base units.
    ///
    /// # Errors
    /// [`DomainError::InvalidState`] for terminal orders, zero fills or
    /// fills larger than the remaining quantity.
    pub fn fill(&mut self, quantity: TokenAmount, now: DateTime<Utc>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidState(format!(
                "order {} is {:?} and cannot be filled",
                self.id, self.status
            )));
        }
        if quantity.is_zero() || quantity > self.remaining_quantity {
            return Err(DomainError::InvalidState(format!(
                "fill of {quantity} exceeds remaining {} on order {}",
                self.remaining_quantity, self.id
            )));
        }
        self.filled_quantity = self.filled_quantity.checked_add(quantity)?;
        self.remaining_quantity = self.remaining_quantity.checked_sub(quantity)?;
        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = now;
        Ok(())
    }

    /// Cancels a resting order. Returns `false` (and changes nothing) when
    /// the order is already terminal.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
        true
    }

    /// Takes `amount` out of the escrow.
    ///
    /// # Errors
    /// [`DomainError::Underflow`] if the escrow cannot cover it.
    pub fn release_escrow(&mut self, amount: TokenAmount) -> DomainResult<TokenAmount> {
        self.escrow = self.escrow.checked_sub(amount)?;
        Ok(amount)
    }

    /// Empties the escrow, returning what was left.
    pub fn drain_escrow(&mut self) -> TokenAmount {
        std::mem::take(&mut self.escrow)
    }
}
