//! Liquidity position persistence, keyed by `provider_poolId`.

use super::MemoryStore;
use hybrid_dex_domain::entities::{LiquidityPosition, PoolId, position_key};
use hybrid_dex_domain::repositories::PositionRepository;

impl PositionRepository for MemoryStore {
    fn position(&self, provider: &str, pool_id: &PoolId) -> Option<LiquidityPosition> {
        self.state
            .positions
            .get(&position_key(provider, pool_id))
            .cloned()
    }

    fn save_position(&mut self, position: LiquidityPosition) {
        let key = position.key();
        self.journal(|c, s| c.position(s, &key));
        self.state.positions.insert(key, position);
    }

    fn remove_position(&mut self, provider: &str, pool_id: &PoolId) {
        let key = position_key(provider, pool_id);
        self.journal(|c, s| c.position(s, &key));
        self.state.positions.remove(&key);
    }

    fn positions_by_provider(&self, provider: &str) -> Vec<LiquidityPosition> {
        self.state
            .positions
            .values()
            .filter(|p| p.provider == provider)
            .cloned()
            .collect()
    }

    fn positions_by_pool(&self, pool_id: &PoolId) -> Vec<LiquidityPosition> {
        self.state
            .positions
            .values()
            .filter(|p| &p.pool_id == pool_id)
            .cloned()
            .collect()
    }
}
