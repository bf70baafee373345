//! In-memory repository implementations.
//!
//! Every collection is a `BTreeMap`, so iteration order is the key order
//! and identical on every replica.

mod balance_ledger;
mod journal;
mod order_repository;
mod pair_repository;
mod pool_repository;
mod position_repository;
mod token_repository;
mod trade_repository;

use anyhow::Context;
use hybrid_dex_domain::entities::{LiquidityPosition, Order, OrderId, PairId, Pool, PoolId, Trade, TradingPair};
use journal::Checkpoint;
use hybrid_dex_domain::repositories::Transactional;
use hybrid_dex_domain::token::{AccountId, Token, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Full engine state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tokens: BTreeMap<String, Token>,
    pub pools: BTreeMap<PoolId, Pool>,
    /// Keyed by `provider_poolId`.
    pub positions: BTreeMap<String, LiquidityPosition>,
    pub pairs: BTreeMap<PairId, TradingPair>,
    pub orders: BTreeMap<OrderId, Order>,
    /// Append-only, in execution order.
    pub trades: Vec<Trade>,
    pub balances: BTreeMap<AccountId, BTreeMap<String, TokenAmount>>,
    pub order_sequence: u64,
}

/// Ordered in-memory store with nested transaction checkpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Snapshot,
    checkpoints: Vec<Checkpoint>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a store from a snapshot.
    #[must_use]
    pub fn from_snapshot(state: Snapshot) -> Self {
        Self {
            state,
            checkpoints: Vec::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.state
    }

    /// Whether a transaction is open.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.checkpoints.is_empty()
    }

    /// Serializes the current state to JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(&self.state).context("failed to serialize store snapshot")
    }

    /// Loads a store from a JSON snapshot.
    ///
    /// # Errors
    /// Returns an error for malformed snapshots.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let state: Snapshot =
            serde_json::from_str(json).context("failed to parse store snapshot")?;
        Ok(Self::from_snapshot(state))
    }

    /// Records the pre-write value of whatever `record` names in the open
    /// checkpoint, if any.
    fn journal(&mut self, record: impl FnOnce(&mut Checkpoint, &Snapshot)) {
        if let Some(checkpoint) = self.checkpoints.last_mut() {
            record(checkpoint, &self.state);
        }
    }
}

impl Transactional for MemoryStore {
    fn begin(&mut self) {
        self.checkpoints.push(Checkpoint::open(&self.state));
        debug!(depth = self.checkpoints.len(), "Transaction started");
    }

    fn commit(&mut self) {
        match self.checkpoints.pop() {
            Some(inner) => {
                if let Some(outer) = self.checkpoints.last_mut() {
                    outer.absorb(inner);
                }
            }
            None => warn!("Commit without an open transaction"),
        }
    }

    fn rollback(&mut self) {
        match self.checkpoints.pop() {
            Some(checkpoint) => {
                checkpoint.undo(&mut self.state);
                debug!(depth = self.checkpoints.len(), "Transaction rolled back");
            }
            None => warn!("Rollback without an open transaction"),
        }
    }
}
