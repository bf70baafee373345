//! Results returned for applied transactions.

use crate::error::ErrorKind;
use crate::route_finder::SwapRoute;
use hybrid_dex_domain::entities::{OrderId, PairId, PoolId, TradeId, Venue};
use hybrid_dex_domain::enums::{OrderStatus, PairStatus, RouteType};
use hybrid_dex_domain::token::{AccountId, TokenAmount};
use hybrid_dex_domain::value_objects::Price;
use serde::{Deserialize, Serialize};

/// Outcome of a successfully applied transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Receipt {
    TokenCreated { symbol: String },
    TokenIssued { symbol: String, to: AccountId, amount: TokenAmount },
    PoolCreated { pool_id: PoolId },
    LiquidityAdded(LiquidityReceipt),
    LiquidityRemoved(LiquidityReceipt),
    FeesClaimed(FeeClaim),
    Swapped(SwapReceipt),
    PairCreated { pair_id: PairId },
    PairStatusChanged { pair_id: PairId, status: PairStatus },
    OrderPlaced(OrderReceipt),
    Trade(TradeReceipt),
    OrderCancelled(CancelReceipt),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub pool_id: PoolId,
    pub provider: AccountId,
    pub amount_a: TokenAmount,
    pub amount_b: TokenAmount,
    /// Shares minted or burned.
    pub shares: TokenAmount,
    /// Provider's share balance afterwards.
    pub share_balance: TokenAmount,
}

/// Fees moved from unclaimed to collected by a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeClaim {
    pub pool_id: PoolId,
    pub provider: AccountId,
    pub fees_a: TokenAmount,
    pub fees_b: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub route: SwapRoute,
    pub trade_ids: Vec<TradeId>,
}

/// A single maker/taker match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub trade_id: TradeId,
    pub maker_order_id: OrderId,
    pub maker: AccountId,
    pub price: Price,
    pub quantity: TokenAmount,
    pub quote_amount: TokenAmount,
}

/// Result of submitting an order to a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub pair_id: PairId,
    /// Present when the order was persisted (limit orders).
    pub order_id: Option<OrderId>,
    pub status: OrderStatus,
    pub fills: Vec<Fill>,
    pub filled_quantity: TokenAmount,
    /// Taker tokens paid to makers.
    pub amount_spent: TokenAmount,
    /// Taker tokens received from makers.
    pub amount_received: TokenAmount,
    /// Taker tokens locked behind the resting remainder.
    pub escrowed: TokenAmount,
    /// Input neither spent nor escrowed; it never left the taker.
    pub unfilled: TokenAmount,
}

/// One executed leg of a hybrid trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegReceipt {
    pub route_type: RouteType,
    /// Pools crossed, or the single pair matched against.
    pub venues: Vec<Venue>,
    /// Input allocated to the leg.
    pub amount_in: TokenAmount,
    /// Input actually consumed (spent or escrowed).
    pub amount_used: TokenAmount,
    pub amount_out: TokenAmount,
    /// Pool fee per hop, each in that hop's input token.
    pub fees: Vec<TokenAmount>,
    pub trade_ids: Vec<TradeId>,
    pub resting_order_id: Option<OrderId>,
}

/// Leg that stopped execution of a non-atomic hybrid trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegFailure {
    pub leg_index: usize,
    pub kind: ErrorKind,
    pub message: String,
}

/// Aggregated result of a hybrid trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: TokenAmount,
    /// Input consumed across all legs.
    pub amount_used: TokenAmount,
    pub amount_out: TokenAmount,
    pub legs: Vec<LegReceipt>,
    pub resting_order_id: Option<OrderId>,
    pub failure: Option<LegFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub order_id: OrderId,
    /// `false` when the order was already filled or cancelled.
    pub cancelled: bool,
    pub refunded: TokenAmount,
}
