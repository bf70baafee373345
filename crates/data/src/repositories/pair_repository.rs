use super::MemoryStore;
use hybrid_dex_domain::entities::{PairId, TradingPair};
use hybrid_dex_domain::repositories::TradingPairRepository;

impl TradingPairRepository for MemoryStore {
    fn pair(&self, id: &PairId) -> Option<TradingPair> {
        self.state.pairs.get(id).cloned()
    }

    fn save_pair(&mut self, pair: TradingPair) {
        self.journal(|c, s| c.pair(s, &pair.id));
        self.state.pairs.insert(pair.id.clone(), pair);
    }

    fn pairs(&self) -> Vec<TradingPair> {
        self.state.pairs.values().cloned().collect()
    }
}
