//! Read-side view of one pair's resting orders.

use crate::error::EngineResult;
use hybrid_dex_domain::entities::{Order, PairId, TradingPair};
use hybrid_dex_domain::enums::OrderSide;
use hybrid_dex_domain::repositories::OrderRepository;
use hybrid_dex_domain::token::TokenAmount;
use hybrid_dex_domain::value_objects::Price;
use serde::{Deserialize, Serialize};

/// Aggregated quantity at one price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: Price,
    pub quantity: TokenAmount,
    pub orders: usize,
}

/// Top of book on both sides, best price first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthSnapshot {
    pub pair_id: PairId,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

/// Constraints of an incoming taker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakerLimits {
    pub side: OrderSide,
    /// Worst acceptable maker price; `None` for market orders.
    pub limit_price: Option<Price>,
    /// Base quantity cap.
    pub max_quantity: Option<TokenAmount>,
    /// Quote spend cap, only meaningful for BUY takers.
    pub quote_budget: Option<TokenAmount>,
}

/// A match the taker would make against one maker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFill {
    pub maker: Order,
    pub price: Price,
    pub quantity: TokenAmount,
    pub quote_amount: TokenAmount,
}

/// Outcome of walking the book without touching it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillPlan {
    pub fills: Vec<PlannedFill>,
    pub filled_quantity: TokenAmount,
    pub quote_amount: TokenAmount,
    /// Matching stopped on depth or price, not on the taker's own caps.
    pub liquidity_exhausted: bool,
}

impl FillPlan {
    /// Tokens the taker pays: quote for BUY, base for SELL.
    #[must_use]
    pub fn taker_spent(&self, side: OrderSide) -> TokenAmount {
        match side {
            OrderSide::Buy => self.quote_amount,
            OrderSide::Sell => self.filled_quantity,
        }
    }

    /// Tokens the taker receives: base for BUY, quote for SELL.
    #[must_use]
    pub fn taker_received(&self, side: OrderSide) -> TokenAmount {
        match side {
            OrderSide::Buy => self.filled_quantity,
            OrderSide::Sell => self.quote_amount,
        }
    }
}

/// Resting orders of one pair in matching priority.
#[derive(Debug, Clone)]
pub struct OrderBook {
    pair: TradingPair,
    /// Highest price first, then oldest.
    bids: Vec<Order>,
    /// Lowest price first, then oldest.
    asks: Vec<Order>,
}

impl OrderBook {
    pub fn load<R: OrderRepository + ?Sized>(pair: TradingPair, repo: &R) -> Self {
        let bids = repo.resting_orders(&pair.id, OrderSide::Buy);
        let asks = repo.resting_orders(&pair.id, OrderSide::Sell);
        Self { pair, bids, asks }
    }

    #[must_use]
    pub fn pair(&self) -> &TradingPair {
        &self.pair
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.first().and_then(|o| o.price)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.first().and_then(|o| o.price)
    }

    /// Best maker price available to a taker on `side`.
    #[must_use]
    pub fn best_price_for(&self, side: OrderSide) -> Option<Price> {
        match side {
            OrderSide::Buy => self.best_ask(),
            OrderSide::Sell => self.best_bid(),
        }
    }

    fn makers_for(&self, side: OrderSide) -> &[Order] {
        match side {
            OrderSide::Buy => &self.asks,
            OrderSide::Sell => &self.bids,
        }
    }

    /// Aggregates up to `levels` price levels per side.
    ///
    /// # Errors
    /// Arithmetic errors only.
    pub fn depth(&self, levels: usize) -> EngineResult<DepthSnapshot> {
        Ok(DepthSnapshot {
            pair_id: self.pair.id.clone(),
            bids: aggregate(&self.bids, levels)?,
            asks: aggregate(&self.asks, levels)?,
        })
    }

    /// Walks the opposite side in priority order and returns the fills a
    /// taker with `limits` would get. Every fill executes at the maker's
    /// price and is a multiple of the lot size.
    ///
    /// # Errors
    /// Arithmetic errors only.
    pub fn plan_fills(&self, limits: &TakerLimits) -> EngineResult<FillPlan> {
        let mut plan = FillPlan {
            liquidity_exhausted: true,
            ..FillPlan::default()
        };
        let mut remaining_quantity = limits.max_quantity;
        let mut remaining_budget = match limits.side {
            OrderSide::Buy => limits.quote_budget,
            OrderSide::Sell => None,
        };

        for maker in self.makers_for(limits.side) {
            let Some(price) = maker.price else {
                continue;
            };
            let crosses = match (limits.side, limits.limit_price) {
                (_, None) => true,
                (OrderSide::Buy, Some(limit)) => price <= limit,
                (OrderSide::Sell, Some(limit)) => price >= limit,
            };
            if !crosses {
                break;
            }

            let mut quantity = maker.remaining_quantity;
            if let Some(cap) = remaining_quantity {
                quantity = quantity.min(cap);
            }
            if let Some(budget) = remaining_budget {
                quantity = quantity.min(self.pair.affordable_quantity(budget, price)?);
            }
            if quantity.is_zero() {
                plan.liquidity_exhausted = false;
                break;
            }
            let capped = quantity < maker.remaining_quantity;

            let quote_amount = self.pair.notional(quantity, price)?;
            plan.filled_quantity = plan.filled_quantity.checked_add(quantity)?;
            plan.quote_amount = plan.quote_amount.checked_add(quote_amount)?;
            if let Some(cap) = remaining_quantity.as_mut() {
                *cap = cap.checked_sub(quantity)?;
            }
            if let Some(budget) = remaining_budget.as_mut() {
                *budget = budget.checked_sub(quote_amount)?;
            }
            plan.fills.push(PlannedFill {
                maker: maker.clone(),
                price,
                quantity,
                quote_amount,
            });
            if capped || remaining_quantity.is_some_and(|q| q.is_zero()) {
                plan.liquidity_exhausted = false;
                break;
            }
        }
        Ok(plan)
    }
}

fn aggregate(orders: &[Order], levels: usize) -> EngineResult<Vec<DepthLevel>> {
    let mut out: Vec<DepthLevel> = Vec::new();
    for order in orders {
        let Some(price) = order.price else {
            continue;
        };
        match out.last_mut() {
            Some(level) if level.price == price => {
                level.quantity = level.quantity.checked_add(order.remaining_quantity)?;
                level.orders += 1;
            }
            _ => {
                if out.len() == levels {
                    break;
                }
                out.push(DepthLevel {
                    price,
                    quantity: order.remaining_quantity,
                    orders: 1,
                });
            }
        }
    }
    Ok(out)
}
