//! Hybrid trade routing across pools and order books.
//!
//! Three modes, picked from the request shape:
//! - explicit `routes`: follow the caller's allocations leg by leg
//! - `price` only: a single limit order on the matching pair
//! - neither: compare AMM-only, book-only and stepped splits, take the best
//!   one whose legs stay within the slippage bound

use crate::config::EngineConfig;
use crate::context::TxContext;
use crate::error::{EngineError, EngineResult};
use crate::guards::{ensure_balance, ensure_positive, require_token};
use crate::order_book::{FillPlan, MatchingEngine, OrderBook, TakerLimits, TakerOrder};
use crate::pool_ledger::PoolLedger;
use crate::receipt::{LegFailure, LegReceipt, TradeReceipt};
use crate::request::{HybridTrade, RouteSpec};
use crate::route_finder::{SwapRoute, find_routes, quote_path, spot_output};
use hybrid_dex_domain::entities::{Pool, PoolId, TradingPair, Venue};
use hybrid_dex_domain::enums::{OrderSide, OrderType, RouteType};
use hybrid_dex_domain::math::mul_div;
use hybrid_dex_domain::repositories::Store;
use hybrid_dex_domain::token::TokenAmount;
use hybrid_dex_domain::value_objects::{BPS_DENOMINATOR, BasisPoints, Price};
use primitive_types::U256;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
enum LegVenue {
    Amm { path: Vec<PoolId> },
    Book {
        pair: TradingPair,
        side: OrderSide,
        order_type: OrderType,
        price: Option<Price>,
    },
}

#[derive(Debug, Clone)]
struct PlannedLeg {
    venue: LegVenue,
    amount_in: TokenAmount,
    min_out: Option<TokenAmount>,
}

/// Splits `amount` by percentage allocations. Every leg but the last gets
/// `floor(amount * allocation / 100)`; the last absorbs the remainder so
/// the legs always add up to `amount`.
///
/// # Errors
/// [`EngineError::Validation`] unless every allocation is positive and they
/// sum to exactly 100.
pub fn split_allocations(amount: TokenAmount, allocations: &[u32]) -> EngineResult<Vec<TokenAmount>> {
    if allocations.is_empty() {
        return Err(EngineError::Validation("routes must not be empty".to_string()));
    }
    if allocations.iter().any(|a| *a == 0) {
        return Err(EngineError::Validation(
            "route allocations must be positive".to_string(),
        ));
    }
    let total: u64 = allocations.iter().map(|a| u64::from(*a)).sum();
    if total != 100 {
        return Err(EngineError::Validation(format!(
            "route allocations sum to {total}, expected 100"
        )));
    }
    let mut parts = Vec::with_capacity(allocations.len());
    let mut assigned = TokenAmount::zero();
    for allocation in &allocations[..allocations.len() - 1] {
        let part = TokenAmount(mul_div(amount.0, U256::from(*allocation), U256::from(100u8))?);
        assigned = assigned.checked_add(part)?;
        parts.push(part);
    }
    parts.push(amount.checked_sub(assigned)?);
    Ok(parts)
}

/// Fails when `actual` falls more than `max` below `ideal`.
///
/// # Errors
/// [`EngineError::SlippageExceeded`].
pub fn check_slippage(ideal: TokenAmount, actual: TokenAmount, max: BasisPoints) -> EngineResult<()> {
    if ideal.is_zero() || actual >= ideal {
        return Ok(());
    }
    let shortfall = ideal.0 - actual.0;
    if shortfall.full_mul(U256::from(BPS_DENOMINATOR)) > ideal.0.full_mul(U256::from(max.get())) {
        return Err(EngineError::SlippageExceeded(format!(
            "output {actual} is more than {max} below the reference {ideal}"
        )));
    }
    Ok(())
}

/// Executes hybrid trades against a [`Store`].
pub struct HybridRouter<'a, S: Store> {
    store: &'a mut S,
    config: &'a EngineConfig,
}

impl<'a, S: Store> HybridRouter<'a, S> {
    pub fn new(store: &'a mut S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Validates, plans and executes `trade` for the transaction sender.
    ///
    /// Validation and planning errors are returned before anything is
    /// mutated. Once a leg has executed, a failing later leg stops execution
    /// and is reported in [`TradeReceipt::failure`]; whether the executed
    /// legs stand is the caller's transaction decision.
    ///
    /// # Errors
    /// Any [`EngineError`] raised before the first leg completes.
    pub fn execute(&mut self, ctx: &mut TxContext, trade: &HybridTrade) -> EngineResult<TradeReceipt> {
        ensure_positive(trade.amount_in, "amountIn")?;
        if trade.token_in == trade.token_out {
            return Err(EngineError::Validation(
                "input and output tokens must differ".to_string(),
            ));
        }
        require_token(&*self.store, &trade.token_in)?;
        require_token(&*self.store, &trade.token_out)?;
        ensure_balance(&*self.store, &ctx.sender, &trade.token_in, trade.amount_in)?;

        let legs = match (&trade.routes, trade.price) {
            (Some(routes), _) => self.plan_explicit(trade, routes)?,
            (None, Some(price)) => self.plan_limit(trade, price)?,
            (None, None) => self.plan_auto(trade)?,
        };

        let mut receipt = TradeReceipt {
            token_in: trade.token_in.clone(),
            token_out: trade.token_out.clone(),
            amount_in: trade.amount_in,
            amount_used: TokenAmount::zero(),
            amount_out: TokenAmount::zero(),
            legs: Vec::with_capacity(legs.len()),
            resting_order_id: None,
            failure: None,
        };
        for (index, leg) in legs.iter().enumerate() {
            match self.execute_leg(ctx, trade, leg) {
                Ok(done) => {
                    receipt.amount_used = receipt.amount_used.checked_add(done.amount_used)?;
                    receipt.amount_out = receipt.amount_out.checked_add(done.amount_out)?;
                    if done.resting_order_id.is_some() {
                        receipt.resting_order_id = done.resting_order_id;
                    }
                    receipt.legs.push(done);
                }
                Err(err) if receipt.legs.is_empty() => return Err(err),
                Err(err) => {
                    warn!(leg = index, error = %err, "Hybrid leg failed, stopping");
                    receipt.failure = Some(LegFailure {
                        leg_index: index,
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                    break;
                }
            }
        }

        info!(
            trader = %ctx.sender,
            token_in = %trade.token_in,
            token_out = %trade.token_out,
            amount_in = %trade.amount_in,
            amount_out = %receipt.amount_out,
            legs = receipt.legs.len(),
            failed = receipt.failure.is_some(),
            "Hybrid trade executed"
        );
        Ok(receipt)
    }

    fn plan_explicit(&self, trade: &HybridTrade, routes: &[RouteSpec]) -> EngineResult<Vec<PlannedLeg>> {
        let allocations: Vec<u32> = routes.iter().map(RouteSpec::allocation).collect();
        let amounts = split_allocations(trade.amount_in, &allocations)?;

        let mut legs = Vec::with_capacity(routes.len());
        for (route, amount_in) in routes.iter().zip(amounts) {
            if amount_in.is_zero() {
                return Err(EngineError::Validation(format!(
                    "allocation of {}% of {} rounds to zero",
                    route.allocation(),
                    trade.amount_in
                )));
            }
            let venue = match route {
                RouteSpec::Amm { details, .. } => {
                    let pool = self.load_pool(&details.pool_id)?;
                    if !pool.contains(&trade.token_in) || !pool.contains(&trade.token_out) {
                        return Err(EngineError::Validation(format!(
                            "pool {} does not trade {} for {}",
                            pool.id, trade.token_in, trade.token_out
                        )));
                    }
                    if !pool.has_liquidity() {
                        return Err(EngineError::InsufficientLiquidity(format!(
                            "pool {} has no liquidity",
                            pool.id
                        )));
                    }
                    LegVenue::Amm { path: vec![pool.id] }
                }
                RouteSpec::Orderbook { details, .. } => {
                    let pair = self
                        .store
                        .pair(&details.pair_id)
                        .ok_or_else(|| {
                            EngineError::Validation(format!("pair {} does not exist", details.pair_id))
                        })?;
                    let side = self.book_side(&pair, trade)?;
                    if side != details.side {
                        return Err(EngineError::Validation(format!(
                            "a {} to {} trade is a {side} on {}, not a {}",
                            trade.token_in, trade.token_out, pair.id, details.side
                        )));
                    }
                    validate_book_leg(&pair, side, details.order_type, details.price, amount_in)?;
                    LegVenue::Book {
                        pair,
                        side,
                        order_type: details.order_type,
                        price: details.price,
                    }
                }
            };
            let min_out = trade
                .min_amount_out
                .map(|min| mul_div(min.0, amount_in.0, trade.amount_in.0).map(TokenAmount))
                .transpose()?;
            legs.push(PlannedLeg {
                venue,
                amount_in,
                min_out,
            });
        }
        Ok(legs)
    }

    fn plan_limit(&self, trade: &HybridTrade, price: Price) -> EngineResult<Vec<PlannedLeg>> {
        let pair = self.find_pair(trade)?.ok_or_else(|| {
            EngineError::Validation(format!(
                "no trading pair for {} and {}",
                trade.token_in, trade.token_out
            ))
        })?;
        let side = self.book_side(&pair, trade)?;
        validate_book_leg(&pair, side, OrderType::Limit, Some(price), trade.amount_in)?;
        Ok(vec![PlannedLeg {
            venue: LegVenue::Book {
                pair,
                side,
                order_type: OrderType::Limit,
                price: Some(price),
            },
            amount_in: trade.amount_in,
            min_out: None,
        }])
    }

    fn plan_auto(&self, trade: &HybridTrade) -> EngineResult<Vec<PlannedLeg>> {
        let pools = self.store.pools();
        let amm = find_routes(
            &pools,
            &trade.token_in,
            &trade.token_out,
            trade.amount_in,
            self.config.max_hops,
        )?
        .next();
        let book = match self.find_pair(trade)? {
            Some(pair) if pair.is_trading() => {
                let side = self.book_side(&pair, trade)?;
                Some((OrderBook::load(pair, &*self.store), side))
            }
            _ => None,
        };

        // None marks a leg that would break the slippage bound
        let max_slippage = self.max_slippage(trade)?;
        let book_out = |amount: TokenAmount| -> EngineResult<Option<TokenAmount>> {
            match &book {
                Some((book, side)) if !amount.is_zero() => {
                    let limits = book_leg_limits(book.pair(), *side, OrderType::Market, None, amount)?;
                    let plan = book.plan_fills(&limits)?;
                    let received = plan.taker_received(*side);
                    if let (Some(max), Some(best)) = (max_slippage, book.best_price_for(*side)) {
                        let ideal = book_reference(book.pair(), *side, &plan, best)?;
                        if check_slippage(ideal, received, max).is_err() {
                            return Ok(None);
                        }
                    }
                    Ok(Some(received))
                }
                _ => Ok(Some(TokenAmount::zero())),
            }
        };
        let amm_out = |path: &[PoolId], amount: TokenAmount| -> EngineResult<Option<TokenAmount>> {
            if amount.is_zero() {
                return Ok(Some(TokenAmount::zero()));
            }
            let out = quote_path(&pools, path, &trade.token_in, amount)?.amount_out;
            if let Some(max) = max_slippage {
                let ideal = spot_output(&pools, path, &trade.token_in, amount)?;
                if check_slippage(ideal, out, max).is_err() {
                    return Ok(None);
                }
            }
            Ok(Some(out))
        };

        // (expected output, AMM share of the input); single sources first so
        // a split only wins when strictly better
        let mut best = (TokenAmount::zero(), TokenAmount::zero());
        let mut over_bound = false;
        let mut consider = |out: Option<TokenAmount>, amm_part: TokenAmount| match out {
            Some(out) if out > best.0 => best = (out, amm_part),
            Some(_) => {}
            None => over_bound = true,
        };
        let path = amm.as_ref().map(SwapRoute::pool_ids);
        if let Some(path) = &path {
            consider(amm_out(path, trade.amount_in)?, trade.amount_in);
        }
        if book.is_some() {
            consider(book_out(trade.amount_in)?, TokenAmount::zero());
        }
        if let (Some(path), Some(_)) = (&path, &book) {
            let step = self.config.split_step_percent.max(1);
            let mut pct = step;
            while pct < 100 {
                let amm_part = TokenAmount(mul_div(
                    trade.amount_in.0,
                    U256::from(pct),
                    U256::from(100u8),
                )?);
                let book_part = trade.amount_in.checked_sub(amm_part)?;
                let out = match (amm_out(path, amm_part)?, book_out(book_part)?) {
                    (Some(amm), Some(book)) => Some(amm.checked_add(book)?),
                    _ => None,
                };
                debug!(amm_percent = pct, expected_out = ?out, "Split candidate");
                consider(out, amm_part);
                pct += step;
            }
        }

        let (expected, amm_part) = best;
        if expected.is_zero() {
            if over_bound {
                return Err(EngineError::SlippageExceeded(format!(
                    "every route for {} to {} moves the price past the slippage bound",
                    trade.token_in, trade.token_out
                )));
            }
            return Err(EngineError::InsufficientLiquidity(format!(
                "no pool or book liquidity for {} to {}",
                trade.token_in, trade.token_out
            )));
        }
        if let Some(min) = trade.min_amount_out.filter(|min| expected < *min) {
            return Err(EngineError::SlippageExceeded(format!(
                "best route yields {expected}, below minAmountOut {min}"
            )));
        }

        let book_part = trade.amount_in.checked_sub(amm_part)?;
        let mut legs = Vec::with_capacity(2);
        if let Some(route) = amm.filter(|_| !amm_part.is_zero()) {
            legs.push(PlannedLeg {
                venue: LegVenue::Amm {
                    path: route.pool_ids(),
                },
                amount_in: amm_part,
                min_out: None,
            });
        }
        if let Some((book, side)) = book.filter(|_| !book_part.is_zero()) {
            legs.push(PlannedLeg {
                venue: LegVenue::Book {
                    pair: book.pair().clone(),
                    side,
                    order_type: OrderType::Market,
                    price: None,
                },
                amount_in: book_part,
                min_out: None,
            });
        }
        info!(
            token_in = %trade.token_in,
            token_out = %trade.token_out,
            amm_in = %amm_part,
            book_in = %book_part,
            expected_out = %expected,
            "Auto route selected"
        );
        Ok(legs)
    }

    fn execute_leg(&mut self, ctx: &mut TxContext, trade: &HybridTrade, leg: &PlannedLeg) -> EngineResult<LegReceipt> {
        let max_slippage = self.max_slippage(trade)?;
        match &leg.venue {
            LegVenue::Amm { path } => {
                let mut pools: Vec<Pool> = Vec::with_capacity(path.len());
                for id in path {
                    pools.push(self.load_pool(id)?);
                }
                let quote = quote_path(&pools, path, &trade.token_in, leg.amount_in)?;
                if quote.amount_out.is_zero() {
                    return Err(EngineError::InsufficientLiquidity(format!(
                        "route through {path:?} yields nothing"
                    )));
                }
                check_min_out(quote.amount_out, leg.min_out)?;
                if let Some(max) = max_slippage {
                    let ideal = spot_output(&pools, path, &trade.token_in, leg.amount_in)?;
                    check_slippage(ideal, quote.amount_out, max)?;
                }
                let sender = ctx.sender.clone();
                let (route, trade_ids) = PoolLedger::new(&mut *self.store, self.config).execute_path(
                    ctx,
                    &sender,
                    path,
                    &trade.token_in,
                    leg.amount_in,
                )?;
                Ok(LegReceipt {
                    route_type: RouteType::Amm,
                    venues: path.iter().cloned().map(Venue::Pool).collect(),
                    amount_in: leg.amount_in,
                    amount_used: leg.amount_in,
                    amount_out: route.amount_out,
                    fees: route.fees(),
                    trade_ids,
                    resting_order_id: None,
                })
            }
            LegVenue::Book {
                pair,
                side,
                order_type,
                price,
            } => {
                let limits = book_leg_limits(pair, *side, *order_type, *price, leg.amount_in)?;
                let taker = TakerOrder {
                    owner: ctx.sender.clone(),
                    side: *side,
                    order_type: *order_type,
                    price: *price,
                    quantity: limits.max_quantity,
                    quote_budget: limits.quote_budget,
                    min_amount_out: leg.min_out,
                };
                if *order_type == OrderType::Market {
                    let book = OrderBook::load(pair.clone(), &*self.store);
                    let plan = book.plan_fills(&limits)?;
                    if let (Some(max), Some(best)) = (max_slippage, book.best_price_for(*side)) {
                        let ideal = book_reference(pair, *side, &plan, best)?;
                        check_slippage(ideal, plan.taker_received(*side), max)?;
                    }
                }
                let order = MatchingEngine::new(&mut *self.store).submit(ctx, pair, &taker)?;
                let resting = order.order_id.filter(|_| !order.escrowed.is_zero());
                Ok(LegReceipt {
                    route_type: RouteType::Orderbook,
                    venues: vec![Venue::Pair(pair.id.clone())],
                    amount_in: leg.amount_in,
                    amount_used: order.amount_spent.checked_add(order.escrowed)?,
                    amount_out: order.amount_received,
                    fees: Vec::new(),
                    trade_ids: order.fills.iter().map(|f| f.trade_id).collect(),
                    resting_order_id: resting,
                })
            }
        }
    }

    /// The caller's bound, else the configured default unless the caller
    /// relies on `minAmountOut` alone.
    fn max_slippage(&self, trade: &HybridTrade) -> EngineResult<Option<BasisPoints>> {
        Ok(match (trade.max_slippage_percent, trade.min_amount_out) {
            (Some(max), _) => Some(max),
            (None, None) => Some(BasisPoints::new(self.config.default_max_slippage_bps)?),
            (None, Some(_)) => None,
        })
    }

    fn load_pool(&self, id: &PoolId) -> EngineResult<Pool> {
        self.store
            .pool(id)
            .ok_or_else(|| EngineError::Validation(format!("pool {id} does not exist")))
    }

    /// First pair, by id, that exchanges the two tokens.
    fn find_pair(&self, trade: &HybridTrade) -> EngineResult<Option<TradingPair>> {
        Ok(self
            .store
            .pairs()
            .into_iter()
            .find(|p| p.side_for(&trade.token_in, &trade.token_out).is_some()))
    }

    fn book_side(&self, pair: &TradingPair, trade: &HybridTrade) -> EngineResult<OrderSide> {
        if !pair.is_trading() {
            return Err(EngineError::Validation(format!("pair {} is halted", pair.id)));
        }
        pair.side_for(&trade.token_in, &trade.token_out).ok_or_else(|| {
            EngineError::Validation(format!(
                "pair {} does not trade {} for {}",
                pair.id, trade.token_in, trade.token_out
            ))
        })
    }
}

/// What the filled part of a book leg would yield if it all traded at the
/// best price.
fn book_reference(pair: &TradingPair, side: OrderSide, plan: &FillPlan, best: Price) -> EngineResult<TokenAmount> {
    Ok(match side {
        OrderSide::Buy => pair.affordable_quantity(plan.quote_amount, best)?,
        OrderSide::Sell => pair.notional(plan.filled_quantity, best)?,
    })
}

fn check_min_out(actual: TokenAmount, min: Option<TokenAmount>) -> EngineResult<()> {
    match min {
        Some(min) if actual < min => Err(EngineError::SlippageExceeded(format!(
            "leg output {actual} is below its minimum {min}"
        ))),
        _ => Ok(()),
    }
}

/// Sizes a book leg from its input amount: BUY legs spend quote, SELL legs
/// sell lot-aligned base.
fn book_leg_limits(
    pair: &TradingPair,
    side: OrderSide,
    order_type: OrderType,
    price: Option<Price>,
    amount_in: TokenAmount,
) -> EngineResult<TakerLimits> {
    let limit_price = match order_type {
        OrderType::Limit => price,
        OrderType::Market => None,
    };
    let limits = match (side, limit_price) {
        (OrderSide::Buy, Some(limit)) => TakerLimits {
            side,
            limit_price,
            max_quantity: Some(pair.affordable_quantity(amount_in, limit)?),
            quote_budget: Some(amount_in),
        },
        (OrderSide::Buy, None) => TakerLimits {
            side,
            limit_price,
            max_quantity: None,
            quote_budget: Some(amount_in),
        },
        (OrderSide::Sell, _) => TakerLimits {
            side,
            limit_price,
            max_quantity: Some(pair.align_to_lot(amount_in)),
            quote_budget: None,
        },
    };
    Ok(limits)
}

fn validate_book_leg(
    pair: &TradingPair,
    side: OrderSide,
    order_type: OrderType,
    price: Option<Price>,
    amount_in: TokenAmount,
) -> EngineResult<()> {
    if order_type == OrderType::Market && price.is_some() {
        return Err(EngineError::Validation(
            "market legs must not carry a price".to_string(),
        ));
    }
    if order_type == OrderType::Limit && price.is_none_or(|p| p.is_zero()) {
        return Err(EngineError::Validation("limit legs require a price".to_string()));
    }
    let limits = book_leg_limits(pair, side, order_type, price, amount_in)?;
    match limits.max_quantity {
        Some(quantity) => pair.validate_order(order_type, price, quantity)?,
        None if amount_in.is_zero() => {
            return Err(EngineError::Validation("leg amount must be positive".to_string()));
        }
        None => {}
    }
    Ok(())
}
