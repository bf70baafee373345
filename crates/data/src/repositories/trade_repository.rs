use super::MemoryStore;
use chrono::{DateTime, Utc};
use hybrid_dex_domain::entities::{Trade, Venue};
use hybrid_dex_domain::repositories::TradeRepository;

impl TradeRepository for MemoryStore {
    fn append_trade(&mut self, trade: Trade) {
        self.state.trades.push(trade);
    }

    fn trades_by_venue(&self, venue: &Venue, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Trade> {
        self.state
            .trades
            .iter()
            .filter(|t| &t.venue == venue && t.timestamp >= from && t.timestamp < to)
            .cloned()
            .collect()
    }
}
