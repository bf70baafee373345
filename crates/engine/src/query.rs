//! Read-only views over engine state.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::fee_accountant::claimable_fees;
use crate::order_book::{DepthSnapshot, OrderBook};
use crate::route_finder::{SwapRoute, find_routes};
use chrono::{DateTime, Duration, Utc};
use hybrid_dex_domain::entities::{LiquidityPosition, Order, PairId, Pool, PoolId, TradingPair, Venue};
use hybrid_dex_domain::enums::OrderStatus;
use hybrid_dex_domain::error::DomainError;
use hybrid_dex_domain::math::{format_amount, parse_amount, plan_withdrawal};
use hybrid_dex_domain::repositories::Store;
use hybrid_dex_domain::token::{Token, TokenAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A position with its live fee entitlement and underlying tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub position: LiquidityPosition,
    pub claimable_fees_a: TokenAmount,
    pub claimable_fees_b: TokenAmount,
    /// Reserves redeemable for the share balance right now.
    pub underlying_a: TokenAmount,
    pub underlying_b: TokenAmount,
}

/// Best route plus ranked alternatives for a prospective swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuote {
    /// `None` when no liquidity connects the tokens.
    pub best: Option<SwapRoute>,
    pub alternatives: Vec<SwapRoute>,
}

/// Swap activity of one pool inside one time bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsBucket {
    pub start: DateTime<Utc>,
    pub swaps: u64,
    /// Input volume sold into the pool, per token.
    pub volume_a: TokenAmount,
    pub volume_b: TokenAmount,
    pub fees_a: TokenAmount,
    pub fees_b: TokenAmount,
}

pub struct QueryService<'a, S: Store> {
    store: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S: Store> QueryService<'a, S> {
    pub fn new(store: &'a S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn list_pools(&self) -> Vec<Pool> {
        self.store.pools()
    }

    /// # Errors
    /// [`EngineError::NotFound`] for an unknown pool.
    pub fn get_pool(&self, id: &PoolId) -> EngineResult<Pool> {
        self.store
            .pool(id)
            .ok_or_else(|| EngineError::NotFound(format!("pool {id}")))
    }

    /// Positions of `provider` with fees computed against the live
    /// accumulators.
    ///
    /// # Errors
    /// Arithmetic errors only.
    pub fn user_positions(&self, provider: &str) -> EngineResult<Vec<PositionView>> {
        let mut views = Vec::new();
        for position in self.store.positions_by_provider(provider) {
            let pool = self.get_pool(&position.pool_id)?;
            let (claimable_fees_a, claimable_fees_b) = claimable_fees(&pool, &position)?;
            let (underlying_a, underlying_b) = if position.share_balance.is_zero() {
                (TokenAmount::zero(), TokenAmount::zero())
            } else {
                plan_withdrawal(
                    position.share_balance,
                    pool.reserve_a,
                    pool.reserve_b,
                    pool.total_shares,
                )?
            };
            views.push(PositionView {
                position,
                claimable_fees_a,
                claimable_fees_b,
                underlying_a,
                underlying_b,
            });
        }
        Ok(views)
    }

    /// # Errors
    /// [`EngineError::Validation`] for identical tokens.
    pub fn route_swap(&self, token_in: &str, token_out: &str, amount_in: TokenAmount) -> EngineResult<RouteQuote> {
        let pools = self.store.pools();
        let mut routes = find_routes(&pools, token_in, token_out, amount_in, self.config.max_hops)?;
        let best = routes.next();
        let alternatives = routes.take(self.config.max_route_alternatives).collect();
        Ok(RouteQuote { best, alternatives })
    }

    /// Buckets the pool's swaps in `[from, to)` by `bucket` width. Only
    /// buckets with activity are returned, oldest first.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for an empty range or a non-positive width.
    pub fn pool_analytics(
        &self,
        pool_id: &PoolId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        bucket: Duration,
    ) -> EngineResult<Vec<AnalyticsBucket>> {
        if to <= from || bucket <= Duration::zero() {
            return Err(EngineError::Validation(
                "analytics need a non-empty range and a positive bucket".to_string(),
            ));
        }
        let pool = self.get_pool(pool_id)?;
        let width = bucket.num_milliseconds().max(1);
        let mut buckets: Vec<AnalyticsBucket> = Vec::new();

        for trade in self.store.trades_by_venue(&Venue::Pool(pool.id.clone()), from, to) {
            let index = (trade.timestamp - from).num_milliseconds() / width;
            let start = from + Duration::milliseconds(index * width);
            if buckets.last().is_none_or(|b| b.start != start) {
                buckets.push(AnalyticsBucket {
                    start,
                    swaps: 0,
                    volume_a: TokenAmount::zero(),
                    volume_b: TokenAmount::zero(),
                    fees_a: TokenAmount::zero(),
                    fees_b: TokenAmount::zero(),
                });
            }
            if let Some(b) = buckets.last_mut() {
                b.swaps += 1;
                if trade.token_in == pool.token_a {
                    b.volume_a = b.volume_a.checked_add(trade.amount_in)?;
                    b.fees_a = b.fees_a.checked_add(trade.fee)?;
                } else {
                    b.volume_b = b.volume_b.checked_add(trade.amount_in)?;
                    b.fees_b = b.fees_b.checked_add(trade.fee)?;
                }
            }
        }
        Ok(buckets)
    }

    /// # Errors
    /// [`EngineError::NotFound`] for an unknown pair.
    pub fn order_book_depth(&self, pair_id: &PairId, levels: usize) -> EngineResult<DepthSnapshot> {
        let pair = self
            .store
            .pair(pair_id)
            .ok_or_else(|| EngineError::NotFound(format!("pair {pair_id}")))?;
        OrderBook::load(pair, self.store).depth(levels)
    }

    pub fn user_orders(&self, owner: &str, status: Option<OrderStatus>) -> Vec<Order> {
        self.store.orders_by_owner(owner, status)
    }

    pub fn trading_pairs(&self) -> Vec<TradingPair> {
        self.store.pairs()
    }

    pub fn balance(&self, account: &str, symbol: &str) -> TokenAmount {
        self.store.balance(account, symbol)
    }

    /// Human price of one `base` token in the pool's other token.
    ///
    /// # Errors
    /// [`EngineError::InsufficientLiquidity`] for empty pools; overflow when
    /// the reserves do not fit a `Decimal`.
    pub fn spot_price(&self, pool_id: &PoolId, base: &str) -> EngineResult<Decimal> {
        let pool = self.get_pool(pool_id)?;
        let (reserve_base, reserve_quote) = pool.reserves_for(base).ok_or_else(|| {
            EngineError::Validation(format!("{base} is not traded in pool {}", pool.id))
        })?;
        if reserve_base.is_zero() || reserve_quote.is_zero() {
            return Err(EngineError::InsufficientLiquidity(format!(
                "pool {} has no liquidity",
                pool.id
            )));
        }
        let quote = pool.other_token(base).unwrap_or_default();
        let base_amount = self.to_decimal(base, reserve_base)?;
        let quote_amount = self.to_decimal(quote, reserve_quote)?;
        quote_amount
            .checked_div(base_amount)
            .ok_or_else(|| EngineError::Domain(DomainError::Overflow("spot price")))
    }

    /// Parses a human amount with the token's decimals.
    ///
    /// # Errors
    /// Unknown token or malformed amount.
    pub fn parse_amount(&self, symbol: &str, human: &str) -> EngineResult<TokenAmount> {
        let token = self.token(symbol)?;
        Ok(parse_amount(human, token.decimals)?)
    }

    /// # Errors
    /// Unknown token.
    pub fn format_amount(&self, symbol: &str, raw: TokenAmount) -> EngineResult<String> {
        let token = self.token(symbol)?;
        Ok(format_amount(raw, token.decimals)?)
    }

    fn token(&self, symbol: &str) -> EngineResult<Token> {
        self.store
            .token(symbol)
            .ok_or_else(|| EngineError::NotFound(format!("token {symbol}")))
    }

    fn to_decimal(&self, symbol: &str, raw: TokenAmount) -> EngineResult<Decimal> {
        let text = self.format_amount(symbol, raw)?;
        Decimal::from_str(&text).map_err(|_| {
EngineError::Domain(DomainError::Overflow("amount exceeds decimal range"))
        })
    }
}
