use crate::entities::order::{OrderId, derive_uuid};
use crate::entities::pool::PoolId;
use crate::entities::trading_pair::PairId;
use crate::enums::OrderSide;
use crate::token::{AccountId, TokenAmount};
use crate::value_objects::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub Uuid);

impl TradeId {
    pub fn derive(tx_id: &str, seq: u32) -> Self {
        Self(derive_uuid("trade", tx_id, seq))
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a trade executed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Venue {
    Pool(PoolId),
    Pair(PairId),
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pool(id) => write!(f, "pool:{id}"),
            Self::Pair(id) => write!(f, "pair:{id}"),
        }
    }
}

/// Immutable record of one execution: a book match or a pool swap hop.
///
/// For book trades `quantity` is the base amount and `price` the maker's
/// price; for pool hops `price` is absent and `quantity` equals `amount_in`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub venue: Venue,
    pub maker_order_id: Option<OrderId>,
    pub maker: Option<AccountId>,
    pub taker: AccountId,
    pub taker_order_id: Option<OrderId>,
    pub taker_side: Option<OrderSide>,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
    pub price: Option<Price>,
    pub quantity: TokenAmount,
    pub fee: TokenAmount,
    pub timestamp: DateTime<Utc>,
}
