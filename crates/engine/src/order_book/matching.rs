//! Order entry, matching and cancellation.
//!
//! Custody: a resting SELL holds its base quantity in escrow, a resting BUY
//! holds `notional(quantity, limit)` quote. Fills are paid out of escrow and
//! a filled or cancelled order refunds whatever escrow is left.

use super::book::{FillPlan, OrderBook, TakerLimits};
use crate::context::TxContext;
use crate::error::{EngineError, EngineResult};
use crate::guards::{ensure_balance, ensure_sender, require_token};
use crate::receipt::{CancelReceipt, Fill, OrderReceipt};
use crate::request::{CancelOrder, CreatePair, PlaceOrder, SetPairStatus};
use hybrid_dex_domain::entities::{Order, PairId, Trade, TradingPair, Venue};
use hybrid_dex_domain::enums::{OrderSide, OrderStatus, OrderType};
use hybrid_dex_domain::repositories::Store;
use hybrid_dex_domain::token::{AccountId, TokenAmount};
use hybrid_dex_domain::value_objects::Price;
use tracing::{debug, info};

/// An order arriving at the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakerOrder {
    pub owner: AccountId,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub price: Option<Price>,
    /// Base quantity; required for limit orders.
    pub quantity: Option<TokenAmount>,
    /// Quote spend cap for BUY orders sized by input.
    pub quote_budget: Option<TokenAmount>,
    /// Minimum the taker must receive; market orders only.
    pub min_amount_out: Option<TokenAmount>,
}

impl TakerOrder {
    fn limits(&self) -> TakerLimits {
        TakerLimits {
            side: self.side,
            limit_price: match self.order_type {
                OrderType::Limit => self.price,
                OrderType::Market => None,
            },
            max_quantity: self.quantity,
            quote_budget: self.quote_budget,
        }
    }
}

/// Order book operations against a [`Store`].
pub struct MatchingEngine<'a, S: Store> {
    store: &'a mut S,
}

impl<'a, S: Store> MatchingEngine<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Registers a trading pair between two existing tokens.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for unknown tokens, invalid sizes or an
    /// existing pair.
    pub fn create_pair(&mut self, ctx: &TxContext, req: &CreatePair) -> EngineResult<PairId> {
        let base = require_token(&*self.store, &req.base_asset_symbol)?;
        require_token(&*self.store, &req.quote_asset_symbol)?;
        let pair = TradingPair::new(
            &req.base_asset_symbol,
            &req.quote_asset_symbol,
            base.decimals,
            req.tick_size,
            req.lot_size,
            req.min_notional,
            req.initial_status,
            ctx.timestamp,
        )?;
        if self.store.pair(&pair.id).is_some() {
            return Err(EngineError::Validation(format!("pair {} already exists", pair.id)));
        }
        let id = pair.id.clone();
        self.store.save_pair(pair);
        info!(pair = %id, creator = %ctx.sender, "Trading pair created");
        Ok(id)
    }

    /// Halts or resumes a pair. Halted pairs reject new orders but still
    /// accept cancellations.
    ///
    /// # Errors
    /// [`EngineError::NotFound`] for an unknown pair.
    pub fn set_pair_status(&mut self, req: &SetPairStatus) -> EngineResult<()> {
        let mut pair = self.load_pair(&req.pair_id)?;
        pair.status = req.status;
        info!(pair = %pair.id, status = ?req.status, "Trading pair status changed");
        self.store.save_pair(pair);
        Ok(())
    }

    /// Direct order entry. Market orders must carry `minAmountOut`.
    ///
    /// # Errors
    /// See [`MatchingEngine::submit`].
    pub fn place_order(&mut self, ctx: &mut TxContext, req: &PlaceOrder) -> EngineResult<OrderReceipt> {
        if req.order_type == OrderType::Market && req.min_amount_out.is_none() {
            return Err(EngineError::Validation(
                "market orders require minAmountOut".to_string(),
            ));
        }
        let pair = self.load_pair(&req.pair_id)?;
        let taker = TakerOrder {
            owner: ctx.sender.clone(),
            side: req.side,
            order_type: req.order_type,
            price: req.price,
            quantity: Some(req.quantity),
            quote_budget: None,
            min_amount_out: req.min_amount_out,
        };
        self.submit(ctx, &pair, &taker)
    }

    /// Prices `taker` against the current book without mutating anything.
    ///
    /// # Errors
    /// Arithmetic errors only.
    pub fn simulate(&self, pair: &TradingPair, taker: &TakerOrder) -> EngineResult<FillPlan> {
        OrderBook::load(pair.clone(), &*self.store).plan_fills(&taker.limits())
    }

    /// Matches `taker` against the book, settles every fill and rests the
    /// remainder of a limit order.
    ///
    /// Balances are checked before the first mutation; an error leaves the
    /// store untouched.
    ///
    /// # Errors
    /// - [`EngineError::Validation`] for halted pairs or tick/lot/notional
    ///   violations
    /// - [`EngineError::InsufficientLiquidity`] when a market order finds no
    ///   maker
    /// - [`EngineError::SlippageExceeded`] below `min_amount_out`
    /// - insufficient balance for the spend plus escrow
    pub fn submit(
        &mut self,
        ctx: &mut TxContext,
        pair: &TradingPair,
        taker: &TakerOrder,
    ) -> EngineResult<OrderReceipt> {
        if !pair.is_trading() {
            return Err(EngineError::Validation(format!("pair {} is halted", pair.id)));
        }
        match (taker.order_type, taker.quantity) {
            (OrderType::Limit, None) => {
                return Err(EngineError::Validation(
                    "limit orders require a quantity".to_string(),
                ));
            }
            (_, Some(quantity)) => pair.validate_order(taker.order_type, taker.price, quantity)?,
            (OrderType::Market, None) => {
                if taker.price.is_some() {
                    return Err(EngineError::Validation(
                        "market orders must not carry a price".to_string(),
                    ));
                }
                if taker.quote_budget.is_none_or(|b| b.is_zero()) {
                    return Err(EngineError::Validation(
                        "market orders need a quantity or a quote budget".to_string(),
                    ));
                }
            }
        }

        let plan = self.simulate(pair, taker)?;
        let side = taker.side;
        let spent = plan.taker_spent(side);
        let received = plan.taker_received(side);
        let (token_in, token_out) = match side {
            OrderSide::Buy => (pair.quote.as_str(), pair.base.as_str()),
            OrderSide::Sell => (pair.base.as_str(), pair.quote.as_str()),
        };

        if taker.order_type == OrderType::Market {
            if plan.fills.is_empty() {
                return Err(EngineError::InsufficientLiquidity(format!(
                    "no resting {} liquidity on {}",
                    side.opposite(),
                    pair.id
                )));
            }
            if let Some(min) = taker.min_amount_out.filter(|min| received < *min) {
                return Err(EngineError::SlippageExceeded(format!(
                    "book output {received} is below minimum {min}"
                )));
            }
        }

        let remainder = match (taker.order_type, taker.quantity) {
            (OrderType::Limit, Some(quantity)) => quantity.checked_sub(plan.filled_quantity)?,
            _ => TokenAmount::zero(),
        };
        let escrow = match (side, taker.price) {
            _ if remainder.is_zero() => TokenAmount::zero(),
            (OrderSide::Buy, Some(price)) => pair.notional(remainder, price)?,
            _ => remainder,
        };
        let debit = spent.checked_add(escrow)?;
        ensure_balance(&*self.store, &taker.owner, token_in, debit)?;
        self.store.debit(&taker.owner, token_in, debit)?;

        let order_id = match taker.order_type {
            OrderType::Limit => Some(ctx.next_order_id()),
            OrderType::Market => None,
        };

        let mut fills = Vec::with_capacity(plan.fills.len());
        for planned in plan.fills {
            let mut maker = planned.maker;
            maker.fill(planned.quantity, ctx.timestamp)?;
            // maker escrow pays the taker, the taker's debit pays the maker
            let (to_taker, to_maker) = match side {
                OrderSide::Buy => (planned.quantity, planned.quote_amount),
                OrderSide::Sell => (planned.quote_amount, planned.quantity),
            };
            maker.release_escrow(to_taker)?;
            self.store.credit(&taker.owner, token_out, to_taker)?;
            self.store.credit(&maker.owner, token_in, to_maker)?;
            if maker.status == OrderStatus::Filled {
                let refund = maker.drain_escrow();
                if !refund.is_zero() {
                    self.store.credit(&maker.owner, token_out, refund)?;
                }
            }

            let trade = Trade {
                id: ctx.next_trade_id(),
                venue: Venue::Pair(pair.id.clone()),
                maker_order_id: Some(maker.id),
                maker: Some(maker.owner.clone()),
                taker: taker.owner.clone(),
                taker_order_id: order_id,
                taker_side: Some(side),
                token_in: token_in.to_string(),
                token_out: token_out.to_string(),
                amount_in: to_maker,
                amount_out: to_taker,
                price: Some(planned.price),
                quantity: planned.quantity,
                fee: TokenAmount::zero(),
                timestamp: ctx.timestamp,
            };
            debug!(
                pair = %pair.id,
                maker_order = %maker.id,
                price = %planned.price,
                quantity = %planned.quantity,
                "Orders matched"
            );
            fills.push(Fill {
                trade_id: trade.id,
                maker_order_id: maker.id,
                maker: maker.owner.clone(),
                price: planned.price,
                quantity: planned.quantity,
                quote_amount: planned.quote_amount,
            });
            self.store.save_order(maker);
            self.store.append_trade(trade);
        }

        let status = match order_id {
            Some(id) => {
                let quantity = taker.quantity.unwrap_or_default();
                let mut order = Order::new(
                    id,
                    pair.id.clone(),
                    taker.owner.clone(),
                    side,
                    OrderType::Limit,
                    taker.price,
                    quantity,
                    ctx.timestamp,
                );
                order.sequence = self.store.next_order_sequence();
                if !plan.filled_quantity.is_zero() {
                    order.fill(plan.filled_quantity, ctx.timestamp)?;
                }
                order.escrow = escrow;
                let status = order.status;
                self.store.save_order(order);
                status
            }
            None if plan.liquidity_exhausted => OrderStatus::PartiallyFilled,
            None => OrderStatus::Filled,
        };

        let unfilled = match (taker.quote_budget, side) {
            (Some(budget), OrderSide::Buy) => budget.checked_sub(debit)?,
            (_, OrderSide::Sell) => taker
                .quantity
                .unwrap_or_default()
                .checked_sub(debit)?,
            _ => TokenAmount::zero(),
        };

        info!(
            pair = %pair.id,
            owner = %taker.owner,
            side = %side,
            order_type = ?taker.order_type,
            filled = %plan.filled_quantity,
            spent = %spent,
            received = %received,
            escrowed = %escrow,
            status = ?status,
            "Order processed"
        );
        Ok(OrderReceipt {
            pair_id: pair.id.clone(),
            order_id,
            status,
            fills,
            filled_quantity: plan.filled_quantity,
            amount_spent: spent,
            amount_received: received,
            escrowed: escrow,
            unfilled,
        })
    }

    /// Cancels a resting order and refunds its escrow. Unknown or terminal
    /// orders are a successful no-op.
    ///
    /// # Errors
    /// [`EngineError::Validation`] when the order belongs to someone else or
    /// to another pair.
    pub fn cancel(&mut self, ctx: &TxContext, req: &CancelOrder) -> EngineResult<CancelReceipt> {
        ensure_sender(ctx, &req.user_id, "userId")?;
        let noop = CancelReceipt {
            order_id: req.order_id,
            cancelled: false,
            refunded: TokenAmount::zero(),
        };
        let Some(mut order) = self.store.order(&req.order_id) else {
            debug!(order = %req.order_id, "Cancel of unknown order ignored");
            return Ok(noop);
        };
        if order.owner != req.user_id {
            return Err(EngineError::Validation(format!(
                "order {} is not owned by {}",
                order.id, req.user_id
            )));
        }
        if order.pair_id != req.pair_id {
            return Err(EngineError::Validation(format!(
                "order {} belongs to pair {}",
                order.id, order.pair_id
            )));
        }
        if !order.cancel(ctx.timestamp) {
            debug!(order = %order.id, status = ?order.status, "Cancel of terminal order ignored");
            return Ok(noop);
        }

        let pair = self.load_pair(&order.pair_id)?;
        let refund_token = match order.side {
            OrderSide::Buy => &pair.quote,
            OrderSide::Sell => &pair.base,
        };
        let refunded = order.drain_escrow();
        if !refunded.is_zero() {
            self.store.credit(&order.owner, refund_token, refunded)?;
        }
        info!(
            order = %order.id,
            owner = %order.owner,
            refunded = %refunded,
            "Order cancelled"
        );
        self.store.save_order(order);
        Ok(CancelReceipt {
            order_id: req.order_id,
            cancelled: true,
            refunded,
        })
    }

    fn load_pair(&self, id: &PairId) -> EngineResult<TradingPair> {
        self.store
            .pair(id)
            .ok_or_else(|| EngineError::NotFound(format!("pair {id}")))
    }
}
