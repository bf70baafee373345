pub mod order;
pub mod pool;
pub mod position;
pub mod trade;
pub mod trading_pair;

// Re-export for easier access
pub use order::{Order, OrderId};
pub use pool::{Pool, PoolId, PoolSide, canonical_pair};
pub use position::{LiquidityPosition, position_key};
pub use trade::{Trade, TradeId, Venue};
pub use trading_pair::{PairId, TradingPair};
