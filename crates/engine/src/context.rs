//! Per-transaction execution context.

use crate::request::Transaction;
use chrono::{DateTime, Utc};
use hybrid_dex_domain::entities::{OrderId, TradeId};
use hybrid_dex_domain::token::AccountId;

/// Identity, consensus time and id counter of the transaction being applied.
///
/// Ids are derived from `tx_id` and a running sequence so that replaying the
/// same transaction stream yields the same ids everywhere.
#[derive(Debug, Clone)]
pub struct TxContext {
    pub tx_id: String,
    pub sender: AccountId,
    pub timestamp: DateTime<Utc>,
    next_seq: u32,
}

impl TxContext {
    pub fn new(tx_id: impl Into<String>, sender: impl Into<AccountId>, timestamp: DateTime<Utc>) -> Self {
        Self {
            tx_id: tx_id.into(),
            sender: sender.into(),
            timestamp,
            next_seq: 0,
        }
    }

    pub fn from_transaction(tx: &Transaction) -> Self {
        Self::new(tx.tx_id.clone(), tx.sender.clone(), tx.timestamp)
    }

    pub fn next_order_id(&mut self) -> OrderId {
        let seq = self.bump();
        OrderId::derive(&self.tx_id, seq)
    }

    pub fn next_trade_id(&mut self) -> TradeId {
        let seq = self.bump();
        TradeId::derive(&self.tx_id, seq)
    }

    fn bump(&mut self) -> u32 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
