//! Constant-product pool state transitions: creation, liquidity, swaps and
//! fee claims.

use crate::config::EngineConfig;
use crate::context::TxContext;
use crate::error::{EngineError, EngineResult};
use crate::fee_accountant;
use crate::guards::{ensure_balance, ensure_positive, ensure_sender, require_token};
use crate::receipt::{FeeClaim, LiquidityReceipt, SwapReceipt};
use crate::request::{AddLiquidity, ClaimFees, PoolCreate, PoolSwap, RemoveLiquidity};
use crate::route_finder::{SwapRoute, apply_hop, quote_path};
use hybrid_dex_domain::entities::{LiquidityPosition, Pool, PoolId, Trade, TradeId, Venue};
use hybrid_dex_domain::error::DomainError;
use hybrid_dex_domain::math::{plan_deposit, plan_withdrawal};
use hybrid_dex_domain::repositories::Store;
use hybrid_dex_domain::token::TokenAmount;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Pool operations against a [`Store`].
pub struct PoolLedger<'a, S: Store> {
    store: &'a mut S,
    config: &'a EngineConfig,
}

impl<'a, S: Store> PoolLedger<'a, S> {
    pub fn new(store: &'a mut S, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    /// Creates an empty pool for two registered tokens.
    ///
    /// # Errors
    /// [`EngineError::Validation`] for unknown tokens, issuer mismatches,
    /// disallowed fee tiers or an existing pool.
    pub fn create_pool(&mut self, ctx: &TxContext, req: &PoolCreate) -> EngineResult<PoolId> {
        if !self.config.allowed_fee_tiers.contains(&req.fee_tier) {
            return Err(EngineError::Validation(format!(
                "fee tier {} is not one of {:?}",
                req.fee_tier, self.config.allowed_fee_tiers
            )));
        }
        if req.token_a_symbol == req.token_b_symbol {
            return Err(EngineError::Validation(
                "a pool needs two different tokens".to_string(),
            ));
        }
        for (symbol, issuer) in [
            (&req.token_a_symbol, &req.token_a_issuer),
            (&req.token_b_symbol, &req.token_b_issuer),
        ] {
            let token = require_token(&*self.store, symbol)?;
            if &token.issuer != issuer {
                return Err(EngineError::Validation(format!(
                    "token {symbol} is issued by {}, not {issuer}",
                    token.issuer
                )));
            }
        }

        let pool = Pool::new(
            &req.token_a_symbol,
            &req.token_b_symbol,
            req.fee_tier,
            ctx.timestamp,
        );
        if self.store.pool(&pool.id).is_some() {
            return Err(EngineError::Validation(format!("pool {} already exists", pool.id)));
        }
        let id = pool.id.clone();
        self.store.save_pool(pool);
        info!(pool = %id, creator = %ctx.sender, "Pool created");
        Ok(id)
    }

    /// Deposits both tokens and mints shares.
    ///
    /// Accrued fees of an existing position are settled before its share
    /// balance changes.
    ///
    /// # Errors
    /// Validation, not-found and balance errors; nothing is mutated on error.
    pub fn add_liquidity(&mut self, ctx: &TxContext, req: &AddLiquidity) -> EngineResult<LiquidityReceipt> {
        ensure_sender(ctx, &req.provider, "provider")?;
        ensure_positive(req.token_a_amount, "tokenA_amount")?;
        ensure_positive(req.token_b_amount, "tokenB_amount")?;
        let mut pool = self.load_pool(&req.pool_id)?;

        let plan = plan_deposit(
            req.token_a_amount,
            req.token_b_amount,
            pool.reserve_a,
            pool.reserve_b,
            pool.total_shares,
        )?;
        ensure_balance(&*self.store, &req.provider, &pool.token_a, plan.amount_a)?;
        ensure_balance(&*self.store, &req.provider, &pool.token_b, plan.amount_b)?;

        let mut position = self
            .store
            .position(&req.provider, &pool.id)
            .unwrap_or_else(|| {
                LiquidityPosition::new(
                    req.provider.clone(),
                    pool.id.clone(),
                    pool.fee_growth_global_a,
                    pool.fee_growth_global_b,
                    ctx.timestamp,
                )
            });
        fee_accountant::settle_position(&pool, &mut position)?;

        self.store.debit(&req.provider, &pool.token_a, plan.amount_a)?;
        self.store.debit(&req.provider, &pool.token_b, plan.amount_b)?;
        pool.reserve_a = pool.reserve_a.checked_add(plan.amount_a)?;
        pool.reserve_b = pool.reserve_b.checked_add(plan.amount_b)?;
        pool.total_shares = pool.total_shares.checked_add(plan.shares)?;
        pool.updated_at = ctx.timestamp;
        position.share_balance = position.share_balance.checked_add(plan.shares)?;
        position.updated_at = ctx.timestamp;

        let receipt = LiquidityReceipt {
            pool_id: pool.id.clone(),
            provider: req.provider.clone(),
            amount_a: plan.amount_a,
            amount_b: plan.amount_b,
            shares: plan.shares,
            share_balance: position.share_balance,
        };
        info!(
            pool = %pool.id,
            provider = %req.provider,
            amount_a = %plan.amount_a,
            amount_b = %plan.amount_b,
            shares = %plan.shares,
            "Liquidity added"
        );
        self.store.save_pool(pool);
        self.store.save_position(position);
        Ok(receipt)
    }

    /// Burns shares and pays out the pro-rata reserves, fees included.
    ///
    /// # Errors
    /// Validation, not-found and share-balance errors.
    pub fn remove_liquidity(
        &mut self,
        ctx: &TxContext,
        req: &RemoveLiquidity,
    ) -> EngineResult<LiquidityReceipt> {
        ensure_sender(ctx, &req.provider, "provider")?;
        ensure_positive(req.lp_token_amount, "lpTokenAmount")?;
        let mut pool = self.load_pool(&req.pool_id)?;
        let mut position = self
            .store
            .position(&req.provider, &pool.id)
            .ok_or_else(|| {
                EngineError::NotFound(format!("position of {} in {}", req.provider, pool.id))
            })?;
        if position.share_balance < req.lp_token_amount {
            return Err(DomainError::InsufficientBalance {
                account: req.provider.clone(),
                symbol: format!("shares of {}", pool.id),
                required: req.lp_token_amount,
                available: position.share_balance,
            }
            .into());
        }

        fee_accountant::settle_position(&pool, &mut position)?;
        let (out_a, out_b) = plan_withdrawal(
            req.lp_token_amount,
            pool.reserve_a,
            pool.reserve_b,
            pool.total_shares,
        )?;

        pool.reserve_a = pool.reserve_a.checked_sub(out_a)?;
        pool.reserve_b = pool.reserve_b.checked_sub(out_b)?;
        pool.total_shares = pool.total_shares.checked_sub(req.lp_token_amount)?;
        pool.updated_at = ctx.timestamp;
        position.share_balance = position.share_balance.checked_sub(req.lp_token_amount)?;
        position.updated_at = ctx.timestamp;
        self.store.credit(&req.provider, &pool.token_a, out_a)?;
        self.store.credit(&req.provider, &pool.token_b, out_b)?;

        let receipt = LiquidityReceipt {
            pool_id: pool.id.clone(),
            provider: req.provider.clone(),
            amount_a: out_a,
            amount_b: out_b,
            shares: req.lp_token_amount,
            share_balance: position.share_balance,
        };
        info!(
            pool = %pool.id,
            provider = %req.provider,
            amount_a = %out_a,
            amount_b = %out_b,
            shares = %req.lp_token_amount,
            "Liquidity removed"
        );
        self.store.save_pool(pool);
        self.persist_position(position);
        Ok(receipt)
    }

    /// Checkpoints the provider's accrued fees as collected.
    ///
    /// # Errors
    /// [`EngineError::NotFound`] without a position.
    pub fn claim_fees(&mut self, ctx: &TxContext, req: &ClaimFees) -> EngineResult<FeeClaim> {
        ensure_sender(ctx, &req.provider, "provider")?;
        let pool = self.load_pool(&req.pool_id)?;
        let mut position = self
            .store
            .position(&req.provider, &pool.id)
            .ok_or_else(|| {
                EngineError::NotFound(format!("position of {} in {}", req.provider, pool.id))
            })?;
        let (fees_a, fees_b) = fee_accountant::claim(&pool, &mut position)?;
        position.updated_at = ctx.timestamp;
        info!(
            pool = %pool.id,
            provider = %req.provider,
            fees_a = %fees_a,
            fees_b = %fees_b,
            "Fees claimed"
        );
        self.persist_position(position);
        Ok(FeeClaim {
            pool_id: pool.id,
            provider: req.provider.clone(),
            fees_a,
            fees_b,
        })
    }

    /// Exact-in swap through a single pool.
    ///
    /// # Errors
    /// [`EngineError::InsufficientLiquidity`] for empty pools or a zero
    /// output, [`EngineError::SlippageExceeded`] below `minAmountOut`.
    pub fn swap(&mut self, ctx: &mut TxContext, req: &PoolSwap) -> EngineResult<SwapReceipt> {
        ensure_sender(ctx, &req.trader, "trader")?;
        ensure_positive(req.amount_in, "amountIn")?;
        if req.token_in_symbol == req.token_out_symbol {
            return Err(EngineError::Validation(
                "input and output tokens must differ".to_string(),
            ));
        }
        let pool = self.load_pool(&req.pool_id)?;
        if !pool.contains(&req.token_in_symbol) || !pool.contains(&req.token_out_symbol) {
            return Err(EngineError::Validation(format!(
                "pool {} does not trade {} for {}",
                pool.id, req.token_in_symbol, req.token_out_symbol
            )));
        }
        if !pool.has_liquidity() {
            return Err(EngineError::InsufficientLiquidity(format!(
                "pool {} has no liquidity",
                pool.id
            )));
        }
        let quote = pool.quote(&req.token_in_symbol, req.amount_in)?;
        if quote.amount_out < req.min_amount_out {
            return Err(EngineError::SlippageExceeded(format!(
                "output {} is below minAmountOut {}",
                quote.amount_out, req.min_amount_out
            )));
        }
        ensure_balance(&*self.store, &req.trader, &req.token_in_symbol, req.amount_in)?;

        let (route, trade_ids) = self.execute_path(
            ctx,
            &req.trader,
            &[pool.id],
            &req.token_in_symbol,
            req.amount_in,
        )?;
        Ok(SwapReceipt { route, trade_ids })
    }

    /// Debits `amount_in`, runs it through `path` and credits the output.
    ///
    /// The whole path is priced before anything is touched, so a zero-output
    /// hop fails without side effects. A pool crossed more than once is
    /// updated hop by hop on one working copy and saved once.
    ///
    /// # Errors
    /// [`EngineError::InsufficientLiquidity`] if any hop yields nothing;
    /// balance and arithmetic errors.
    pub fn execute_path(
        &mut self,
        ctx: &mut TxContext,
        trader: &str,
        path: &[PoolId],
        token_in: &str,
        amount_in: TokenAmount,
    ) -> EngineResult<(SwapRoute, Vec<TradeId>)> {
        if path.is_empty() {
            return Err(EngineError::Validation("empty swap path".to_string()));
        }
        let mut working: BTreeMap<PoolId, Pool> = BTreeMap::new();
        for id in path {
            if !working.contains_key(id) {
                working.insert(id.clone(), self.load_pool(id)?);
            }
        }
        let pools: Vec<Pool> = working.values().cloned().collect();
        let route = quote_path(&pools, path, token_in, amount_in)?;
        if let Some(dry) = route.hops.iter().find(|h| h.amount_out.is_zero()) {
            return Err(EngineError::InsufficientLiquidity(format!(
                "pool {} yields nothing for {} {}",
                dry.pool_id, dry.amount_in, dry.token_in
            )));
        }

        self.store.debit(trader, token_in, amount_in)?;
        let mut trade_ids = Vec::with_capacity(route.hops.len());
        for hop in &route.hops {
            let pool = working
                .get_mut(&hop.pool_id)
                .ok_or_else(|| EngineError::NotFound(format!("pool {}", hop.pool_id)))?;
            let side_in = apply_hop(pool, hop)?;
            fee_accountant::accrue_swap_fee(pool, side_in, hop.fee)?;
            pool.updated_at = ctx.timestamp;

            let trade = Trade {
                id: ctx.next_trade_id(),
                venue: Venue::Pool(pool.id.clone()),
                maker_order_id: None,
                maker: None,
                taker: trader.to_string(),
                taker_order_id: None,
                taker_side: None,
                token_in: hop.token_in.clone(),
                token_out: hop.token_out.clone(),
                amount_in: hop.amount_in,
                amount_out: hop.amount_out,
                price: None,
                quantity: hop.amount_in,
                fee: hop.fee,
                timestamp: ctx.timestamp,
            };
            debug!(
                pool = %pool.id,
                amount_in = %hop.amount_in,
                amount_out = %hop.amount_out,
                fee = %hop.fee,
                "Swap hop executed"
            );
            trade_ids.push(trade.id);
            self.store.append_trade(trade);
        }
        for pool in working.into_values() {
            self.store.save_pool(pool);
        }
        let token_out = route
            .hops
            .last()
            .map(|h| h.token_out.clone())
            .unwrap_or_default();
        self.store.credit(trader, &token_out, route.amount_out)?;
        info!(
            trader,
            token_in,
            token_out = %token_out,
            amount_in = %amount_in,
            amount_out = %route.amount_out,
            hops = route.hops.len(),
            "Swap executed"
        );
        Ok((route, trade_ids))
    }

    fn load_pool(&self, id: &PoolId) -> EngineResult<Pool> {
        self.store
            .pool(id)
            .ok_or_else(|| EngineError::NotFound(format!("pool {id}")))
    }

    fn persist_position(&mut self, position: LiquidityPosition) {
        if position.is_empty() {
            self.store.remove_position(&position.provider, &position.pool_id);
        } else {
            self.store.save_position(position);
        }
    }
}
