//! Prelude module for convenient imports.
//!
//! ```rust
//! use hybrid_dex_domain::prelude::*;
//! ```

pub use crate::entities::{
    LiquidityPosition, Order, OrderId, PairId, Pool, PoolId, PoolSide, Trade, TradeId,
    TradingPair, Venue,
};
pub use crate::enums::{OrderSide, OrderStatus, OrderType, PairStatus, RouteType};
pub use crate::error::{DomainError, DomainResult};
pub use crate::math::{SwapQuote, format_amount, parse_amount};
pub use crate::repositories::{
    BalanceLedger, OrderRepository, PoolRepository, PositionRepository, Store, TokenRepository,
    TradeRepository, TradingPairRepository, Transactional,
};
pub use crate::token::{AccountId, Token, TokenAmount};
pub use crate::value_objects::{BasisPoints, Price};
pub use primitive_types::U256;
