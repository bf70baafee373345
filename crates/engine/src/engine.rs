//! Transaction entry point.

use crate::config::EngineConfig;
use crate::context::TxContext;
use crate::error::{EngineError, EngineResult, ErrorKind, Rejection};
use crate::order_book::MatchingEngine;
use crate::pool_ledger::PoolLedger;
use crate::query::QueryService;
use crate::receipt::{Receipt, TradeReceipt};
use crate::request::{Transaction, TradeRequest};
use crate::router::HybridRouter;
use crate::tokens::TokenRegistry;
use hybrid_dex_domain::repositories::Store;
use tracing::{info, warn};

/// Applies consensus-ordered transactions to a [`Store`].
///
/// Each transaction runs inside its own store transaction: it either
/// commits in full or leaves no trace. The one exception is a multi-leg
/// hybrid trade with `atomic_trades` disabled, whose completed legs are
/// kept when a later leg fails.
pub struct Engine<S: Store> {
    store: S,
    config: EngineConfig,
}

impl<S: Store> Engine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read-only queries over the current state.
    pub fn query(&self) -> QueryService<'_, S> {
        QueryService::new(&self.store, &self.config)
    }

    /// Applies one transaction.
    ///
    /// # Errors
    /// A [`Rejection`] describing why nothing (or, for non-atomic hybrid
    /// trades, only the reported partial fill) was applied.
    pub fn apply(&mut self, tx: &Transaction) -> Result<Receipt, Rejection> {
        let mut ctx = TxContext::from_transaction(tx);
        self.store.begin();
        let outcome = self.dispatch(&mut ctx, &tx.request);

        match outcome {
            Ok(Receipt::Trade(receipt)) if receipt.failure.is_some() => {
                Err(self.finish_partial_trade(tx, receipt))
            }
            Ok(receipt) => {
                self.store.commit();
                info!(tx = %tx.tx_id, contract = tx.request.name(), "Transaction applied");
                Ok(receipt)
            }
            Err(err) => {
                self.store.rollback();
                warn!(
                    tx = %tx.tx_id,
                    contract = tx.request.name(),
                    error = %err,
                    "Transaction rejected"
                );
                Err(Rejection::new(&err))
            }
        }
    }

    /// A hybrid trade failed after some legs executed.
    fn finish_partial_trade(&mut self, tx: &Transaction, receipt: TradeReceipt) -> Rejection {
        let (kind, message) = receipt
            .failure
            .as_ref()
            .map(|f| (f.kind, f.message.clone()))
            .unwrap_or((ErrorKind::Validation, String::new()));
        let rejection = Rejection {
            kind,
            message,
            partial: None,
        };
        if self.config.atomic_trades {
            self.store.rollback();
            warn!(tx = %tx.tx_id, reason = %rejection, "Hybrid trade rolled back");
            rejection
        } else {
            self.store.commit();
            warn!(
                tx = %tx.tx_id,
                reason = %rejection,
                legs = receipt.legs.len(),
                "Hybrid trade partially executed"
            );
            rejection.with_partial(receipt)
        }
    }

    fn dispatch(&mut self, ctx: &mut TxContext, request: &TradeRequest) -> EngineResult<Receipt> {
        let config = &self.config;
        let store = &mut self.store;
        match request {
            TradeRequest::TokenCreate(req) => {
                let token = TokenRegistry::new(store).create(ctx, req)?;
                Ok(Receipt::TokenCreated {
                    symbol: token.symbol,
                })
            }
            TradeRequest::TokenIssue(req) => {
                TokenRegistry::new(store).issue(ctx, req)?;
                Ok(Receipt::TokenIssued {
                    symbol: req.symbol.clone(),
                    to: req.to.clone(),
                    amount: req.amount,
                })
            }
            TradeRequest::PoolCreate(req) => {
                let pool_id = PoolLedger::new(store, config).create_pool(ctx, req)?;
                Ok(Receipt::PoolCreated { pool_id })
            }
            TradeRequest::PoolAddLiquidity(req) => PoolLedger::new(store, config)
                .add_liquidity(ctx, req)
                .map(Receipt::LiquidityAdded),
            TradeRequest::PoolRemoveLiquidity(req) => PoolLedger::new(store, config)
                .remove_liquidity(ctx, req)
                .map(Receipt::LiquidityRemoved),
            TradeRequest::PoolClaimFees(req) => PoolLedger::new(store, config)
                .claim_fees(ctx, req)
                .map(Receipt::FeesClaimed),
            TradeRequest::PoolSwap(req) => PoolLedger::new(store, config)
                .swap(ctx, req)
                .map(Receipt::Swapped),
            TradeRequest::MarketCreatePair(req) => {
                let pair_id = MatchingEngine::new(store).create_pair(ctx, req)?;
                Ok(Receipt::PairCreated { pair_id })
            }
            TradeRequest::MarketSetPairStatus(req) => {
                MatchingEngine::new(store).set_pair_status(req)?;
                Ok(Receipt::PairStatusChanged {
                    pair_id: req.pair_id.clone(),
                    status: req.status,
                })
            }
            TradeRequest::MarketPlaceOrder(req) => MatchingEngine::new(store)
                .place_order(ctx, req)
                .map(Receipt::OrderPlaced),
            TradeRequest::HybridTrade(req) => HybridRouter::new(store, config)
                .execute(ctx, req)
                .map(Receipt::Trade),
            TradeRequest::MarketCancelOrder(req) => MatchingEngine::new(store)
                .cancel(ctx, req)
                .map(Receipt::OrderCancelled),
        }
    }
}

impl<S: Store + Default> Default for Engine<S> {
    fn default() -> Self {
        Self::new(S::default(), EngineConfig::default())
    }
}

/// Convenience for callers that only need the error of a rejected request.
impl From<EngineError> for Rejection {
    fn from(err: EngineError) -> Self {
        Rejection::new(&err)
    }
}
