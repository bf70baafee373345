//! Undo journal behind [`MemoryStore`](super::MemoryStore) transactions.
//!
//! A checkpoint records the value each key held before its first write
//! inside the transaction. Rolling back replays those values; the trade log
//! is truncated to its length at `begin`. Cost is proportional to what the
//! transaction touched, not to the size of the store.

use super::Snapshot;
use hybrid_dex_domain::entities::{LiquidityPosition, Order, OrderId, PairId, Pool, PoolId, TradingPair};
use hybrid_dex_domain::token::{AccountId, Token, TokenAmount};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

#[derive(Debug, Clone, Default)]
pub(super) struct Checkpoint {
    tokens: BTreeMap<String, Option<Token>>,
    pools: BTreeMap<PoolId, Option<Pool>>,
    positions: BTreeMap<String, Option<LiquidityPosition>>,
    pairs: BTreeMap<PairId, Option<TradingPair>>,
    orders: BTreeMap<OrderId, Option<Order>>,
    balances: BTreeMap<(AccountId, String), Option<TokenAmount>>,
    trades_len: usize,
    order_sequence: u64,
}

/// Keeps the first recorded value of `key`.
fn remember<K: Ord, V>(undo: &mut BTreeMap<K, Option<V>>, key: K, before: impl FnOnce() -> Option<V>) {
    if let Entry::Vacant(slot) = undo.entry(key) {
        slot.insert(before());
    }
}

fn restore<K: Ord, V>(target: &mut BTreeMap<K, V>, undo: BTreeMap<K, Option<V>>) {
    for (key, before) in undo {
        match before {
            Some(value) => {
                target.insert(key, value);
            }
            None => {
                target.remove(&key);
            }
        }
    }
}

/// Moves entries the outer checkpoint has not seen yet.
fn absorb<K: Ord, V>(outer: &mut BTreeMap<K, Option<V>>, inner: BTreeMap<K, Option<V>>) {
    for (key, before) in inner {
        outer.entry(key).or_insert(before);
    }
}

impl Checkpoint {
    pub(super) fn open(state: &Snapshot) -> Self {
        Self {
            trades_len: state.trades.len(),
            order_sequence: state.order_sequence,
            ..Self::default()
        }
    }

    pub(super) fn token(&mut self, state: &Snapshot, symbol: &str) {
        remember(&mut self.tokens, symbol.to_string(), || state.tokens.get(symbol).cloned());
    }

    pub(super) fn pool(&mut self, state: &Snapshot, id: &PoolId) {
        remember(&mut self.pools, id.clone(), || state.pools.get(id).cloned());
    }

    pub(super) fn position(&mut self, state: &Snapshot, key: &str) {
        remember(&mut self.positions, key.to_string(), || state.positions.get(key).cloned());
    }

    pub(super) fn pair(&mut self, state: &Snapshot, id: &PairId) {
        remember(&mut self.pairs, id.clone(), || state.pairs.get(id).cloned());
    }

    pub(super) fn order(&mut self, state: &Snapshot, id: OrderId) {
        remember(&mut self.orders, id, || state.orders.get(&id).cloned());
    }

    pub(super) fn balance(&mut self, state: &Snapshot, account: &str, symbol: &str) {
        remember(
            &mut self.balances,
            (account.to_string(), symbol.to_string()),
            || state.balances.get(account).and_then(|b| b.get(symbol)).copied(),
        );
    }

    /// Folds a committed inner checkpoint into this one.
    pub(super) fn absorb(&mut self, inner: Checkpoint) {
        absorb(&mut self.tokens, inner.tokens);
        absorb(&mut self.pools, inner.pools);
        absorb(&mut self.positions, inner.positions);
        absorb(&mut self.pairs, inner.pairs);
        absorb(&mut self.orders, inner.orders);
        absorb(&mut self.balances, inner.balances);
    }

    /// Puts `state` back to where it was when the checkpoint opened.
    pub(super) fn undo(self, state: &mut Snapshot) {
        restore(&mut state.tokens, self.tokens);
        restore(&mut state.pools, self.pools);
        restore(&mut state.positions, self.positions);
        restore(&mut state.pairs, self.pairs);
        restore(&mut state.orders, self.orders);
        for ((account, symbol), before) in self.balances {
            match before {
                Some(amount) => {
                    state.balances.entry(account).or_default().insert(symbol, amount);
                }
                None => {
                    if let Some(balances) = state.balances.get_mut(&account) {
                        balances.remove(&symbol);
                        if balances.is_empty() {
                            state.balances.remove(&account);
                        }
                    }
                }
            }
        }
        state.trades.truncate(self.trades_len);
        state.order_sequence = self.order_sequence;
    }
}
