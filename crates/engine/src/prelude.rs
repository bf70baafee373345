//! Prelude module for convenient imports.
//!
//! ```rust
//! use hybrid_dex_engine::prelude::*;
//! ```

pub use crate::config::{ConfigError, EngineConfig};
pub use crate::context::TxContext;
pub use crate::engine::Engine;
pub use crate::error::{EngineError, EngineResult, ErrorKind, Rejection};
pub use crate::order_book::{DepthLevel, DepthSnapshot, OrderBook};
pub use crate::query::{AnalyticsBucket, PositionView, QueryService, RouteQuote};
pub use crate::receipt::{
    CancelReceipt, FeeClaim, Fill, LegFailure, LegReceipt, LiquidityReceipt, OrderReceipt,
    Receipt, SwapReceipt, TradeReceipt,
};
pub use crate::request::{
    AddLiquidity, AmmRoute, CancelOrder, ClaimFees, CreatePair, HybridTrade, OrderbookRoute,
    PlaceOrder, PoolCreate, PoolSwap, RemoveLiquidity, RouteSpec, SetPairStatus, TokenCreate,
    TokenIssue, TradeRequest, Transaction,
};
pub use crate::route_finder::{RouteHop, SwapRoute, find_routes};
