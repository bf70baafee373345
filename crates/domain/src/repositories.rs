//! Persistence and ledger ports.
//!
//! The engine holds no state of its own; everything it reads or writes goes
//! through these traits. Implementations must return collections in a
//! deterministic order (by key) so every replica observes the same sequence.

use crate::entities::{
    LiquidityPosition, Order, OrderId, PairId, Pool, PoolId, Trade, TradingPair, Venue,
};
use crate::enums::{OrderSide, OrderStatus};
use crate::error::DomainResult;
use crate::token::{Token, TokenAmount};
use chrono::{DateTime, Utc};

/// Registered tokens, keyed by symbol.
pub trait TokenRepository {
    fn token(&self, symbol: &str) -> Option<Token>;
    fn save_token(&mut self, token: Token);
    fn tokens(&self) -> Vec<Token>;
}

/// `pools` collection, keyed by pool id.
pub trait PoolRepository {
    fn pool(&self, id: &PoolId) -> Option<Pool>;
    fn save_pool(&mut self, pool: Pool);
    /// All pools ordered by id.
    fn pools(&self) -> Vec<Pool>;
}

/// `userLiquidityPositions` collection, keyed by `provider_poolId`.
pub trait PositionRepository {
    fn position(&self, provider: &str, pool_id: &PoolId) -> Option<LiquidityPosition>;
    fn save_position(&mut self, position: LiquidityPosition);
    fn remove_position(&mut self, provider: &str, pool_id: &PoolId);
    fn positions_by_provider(&self, provider: &str) -> Vec<LiquidityPosition>;
    fn positions_by_pool(&self, pool_id: &PoolId) -> Vec<LiquidityPosition>;
}

/// `tradingPairs` collection, keyed by pair id.
pub trait TradingPairRepository {
    fn pair(&self, id: &PairId) -> Option<TradingPair>;
    fn save_pair(&mut self, pair: TradingPair);
    fn pairs(&self) -> Vec<TradingPair>;
}

/// `orders` collection with `(pairId, status)` and `(owner, status)` lookups.
pub trait OrderRepository {
    fn order(&self, id: &OrderId) -> Option<Order>;
    fn save_order(&mut self, order: Order);
    /// Resting orders of one side in price/time priority: ascending price
    /// for SELL, descending for BUY, then ascending sequence.
    fn resting_orders(&self, pair_id: &PairId, side: OrderSide) -> Vec<Order>;
    fn orders_by_pair(&self, pair_id: &PairId, status: Option<OrderStatus>) -> Vec<Order>;
    fn orders_by_owner(&self, owner: &str, status: Option<OrderStatus>) -> Vec<Order>;
    /// Next value of the book-wide arrival counter.
    fn next_order_sequence(&mut self) -> u64;
}

/// Append-only `trades` collection.
pub trait TradeRepository {
    fn append_trade(&mut self, trade: Trade);
    /// Trades on `venue` with `from <= timestamp < to`, oldest first.
    fn trades_by_venue(&self, venue: &Venue, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Trade>;
}

/// Account balances, owned by the outer ledger.
pub trait BalanceLedger {
    fn balance(&self, account: &str, symbol: &str) -> TokenAmount;

    /// # Errors
    /// [`DomainError::InsufficientBalance`](crate::error::DomainError::InsufficientBalance)
    /// when the account cannot cover `amount`.
    fn debit(&mut self, account: &str, symbol: &str, amount: TokenAmount) -> DomainResult<()>;

    /// # Errors
    /// [`DomainError::Overflow`](crate::error::DomainError::Overflow) past `2^256 - 1`.
    fn credit(&mut self, account: &str, symbol: &str, amount: TokenAmount) -> DomainResult<()>;
}

/// Transaction boundary around one request.
pub trait Transactional {
    fn begin(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}

/// Everything the engine needs from its surroundings.
pub trait Store:
    TokenRepository
    + PoolRepository
    + PositionRepository
    + TradingPairRepository
    + OrderRepository
    + TradeRepository
    + BalanceLedger
    + Transactional
{
}

impl<T> Store for T where
    T: TokenRepository
        + PoolRepository
        + PositionRepository
        + TradingPairRepository
        + OrderRepository
        + TradeRepository
        + BalanceLedger
        + Transactional
{
}
