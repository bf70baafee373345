//! Consensus-delivered transactions and their payloads.
//!
//! Raw amounts travel as decimal-string integers. Slippage percentages are
//! converted to basis points while deserializing and never touch floating
//! point afterwards.

use chrono::{DateTime, Utc};
use hybrid_dex_domain::entities::{OrderId, PairId, PoolId};
use hybrid_dex_domain::enums::{OrderSide, OrderType, PairStatus, RouteType};
use hybrid_dex_domain::token::{AccountId, TokenAmount};
use hybrid_dex_domain::value_objects::{BasisPoints, Price};
use serde::{Deserialize, Serialize};

/// A request together with its consensus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub tx_id: String,
    pub sender: AccountId,
    /// Consensus time; the only clock the engine reads.
    pub timestamp: DateTime<Utc>,
    pub request: TradeRequest,
}

impl Transaction {
    pub fn new(
        tx_id: impl Into<String>,
        sender: impl Into<AccountId>,
        timestamp: DateTime<Utc>,
        request: TradeRequest,
    ) -> Self {
        Self {
            tx_id: tx_id.into(),
            sender: sender.into(),
            timestamp,
            request,
        }
    }
}

/// Contract action, tagged by its `contract` name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "contract", content = "payload", rename_all = "snake_case")]
pub enum TradeRequest {
    TokenCreate(TokenCreate),
    TokenIssue(TokenIssue),
    PoolCreate(PoolCreate),
    PoolAddLiquidity(AddLiquidity),
    PoolRemoveLiquidity(RemoveLiquidity),
    PoolClaimFees(ClaimFees),
    PoolSwap(PoolSwap),
    MarketCreatePair(CreatePair),
    MarketSetPairStatus(SetPairStatus),
    MarketPlaceOrder(PlaceOrder),
    #[serde(alias = "market_trade")]
    HybridTrade(HybridTrade),
    MarketCancelOrder(CancelOrder),
}

impl TradeRequest {
    /// Contract name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokenCreate(_) => "token_create",
            Self::TokenIssue(_) => "token_issue",
            Self::PoolCreate(_) => "pool_create",
            Self::PoolAddLiquidity(_) => "pool_add_liquidity",
            Self::PoolRemoveLiquidity(_) => "pool_remove_liquidity",
            Self::PoolClaimFees(_) => "pool_claim_fees",
            Self::PoolSwap(_) => "pool_swap",
            Self::MarketCreatePair(_) => "market_create_pair",
            Self::MarketSetPairStatus(_) => "market_set_pair_status",
            Self::MarketPlaceOrder(_) => "market_place_order",
            Self::HybridTrade(_) => "hybrid_trade",
            Self::MarketCancelOrder(_) => "market_cancel_order",
        }
    }
}

/// Registers a token issued by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenCreate {
    pub symbol: String,
    pub decimals: u8,
}

/// Mints `amount` raw units to `to`; only the issuer may call it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenIssue {
    pub symbol: String,
    pub to: AccountId,
    pub amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCreate {
    #[serde(rename = "tokenA_symbol")]
    pub token_a_symbol: String,
    #[serde(rename = "tokenA_issuer")]
    pub token_a_issuer: AccountId,
    #[serde(rename = "tokenB_symbol")]
    pub token_b_symbol: String,
    #[serde(rename = "tokenB_issuer")]
    pub token_b_issuer: AccountId,
    #[serde(rename = "feeTier")]
    pub fee_tier: u32,
}

/// Amounts are maxima; a later deposit only takes what matches the ratio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLiquidity {
    #[serde(rename = "poolId")]
    pub pool_id: PoolId,
    pub provider: AccountId,
    #[serde(rename = "tokenA_amount")]
    pub token_a_amount: TokenAmount,
    #[serde(rename = "tokenB_amount")]
    pub token_b_amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveLiquidity {
    pub pool_id: PoolId,
    pub provider: AccountId,
    pub lp_token_amount: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimFees {
    pub pool_id: PoolId,
    pub provider: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSwap {
    #[serde(rename = "poolId")]
    pub pool_id: PoolId,
    pub trader: AccountId,
    #[serde(rename = "tokenIn_symbol")]
    pub token_in_symbol: String,
    #[serde(rename = "tokenOut_symbol")]
    pub token_out_symbol: String,
    #[serde(rename = "amountIn")]
    pub amount_in: TokenAmount,
    #[serde(rename = "minAmountOut")]
    pub min_amount_out: TokenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePair {
    pub base_asset_symbol: String,
    pub quote_asset_symbol: String,
    pub tick_size: Price,
    pub lot_size: TokenAmount,
    pub min_notional: TokenAmount,
    #[serde(default = "default_pair_status")]
    pub initial_status: PairStatus,
}

fn default_pair_status() -> PairStatus {
    PairStatus::Trading
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPairStatus {
    pub pair_id: PairId,
    pub status: PairStatus,
}

/// Direct order entry on one pair. `quantity` is in raw base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrder {
    pub pair_id: PairId,
    pub side: OrderSide,
    pub order_type: OrderType,
    #[serde(default)]
    pub price: Option<Price>,
    pub quantity: TokenAmount,
    #[serde(default)]
    pub min_amount_out: Option<TokenAmount>,
}

/// Exact-in trade across pools and/or order books.
///
/// With explicit `routes` the allocations are followed as given; with only
/// `price` a single limit order is placed; otherwise the router chooses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridTrade {
    pub token_in: String,
    pub token_out: String,
    pub amount_in: TokenAmount,
    #[serde(default)]
    pub price: Option<Price>,
    #[serde(default)]
    pub min_amount_out: Option<TokenAmount>,
    #[serde(default, with = "slippage_percent", skip_serializing_if = "Option::is_none")]
    pub max_slippage_percent: Option<BasisPoints>,
    #[serde(default)]
    pub routes: Option<Vec<RouteSpec>>,
}

/// One caller-specified leg of a hybrid trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteSpec {
    Amm {
        allocation: u32,
        details: AmmRoute,
    },
    Orderbook {
        allocation: u32,
        details: OrderbookRoute,
    },
}

impl RouteSpec {
    /// Percentage of `amountIn` routed through this leg.
    #[must_use]
    pub fn allocation(&self) -> u32 {
        match self {
            Self::Amm { allocation, .. } | Self::Orderbook { allocation, .. } => *allocation,
        }
    }

    #[must_use]
    pub fn route_type(&self) -> RouteType {
        match self {
            Self::Amm { .. } => RouteType::Amm,
            Self::Orderbook { .. } => RouteType::Orderbook,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmmRoute {
    pub pool_id: PoolId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderbookRoute {
    pub pair_id: PairId,
    pub side: OrderSide,
    pub order_type: OrderType,
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrder {
    pub user_id: AccountId,
    pub order_id: OrderId,
    pub pair_id: PairId,
}

/// `maxSlippagePercent` as JSON number or string, stored in basis points.
///
/// Numbers are read through their decimal text so `0.5` becomes exactly
/// 50 bps.
mod slippage_percent {
    use hybrid_dex_domain::value_objects::BasisPoints;
    use rust_decimal::Decimal;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &Option<BasisPoints>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bps) => s.collect_str(&bps.to_percent().normalize()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<BasisPoints>, D::Error> {
        let text = match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(D::Error::custom(format!(
                    "maxSlippagePercent must be a number, got {other}"
                )));
            }
        };
        let percent = Decimal::from_str(text.trim())
            .or_else(|_| Decimal::from_scientific(text.trim()))
            .map_err(|_| D::Error::custom(format!("invalid maxSlippagePercent '{text}'")))?;
        BasisPoints::from_percent(percent)
            .map(Some)
            .map_err(D::Error::custom)
    }
}
