//! Pool persistence.

use super::MemoryStore;
use hybrid_dex_domain::entities::{Pool, PoolId};
use hybrid_dex_domain::repositories::PoolRepository;

impl PoolRepository for MemoryStore {
    fn pool(&self, id: &PoolId) -> Option<Pool> {
        self.state.pools.get(id).cloned()
    }

    fn save_pool(&mut self, pool: Pool) {
        self.journal(|c, s| c.pool(s, &pool.id));
        self.state.pools.insert(pool.id.clone(), pool);
    }

    fn pools(&self) -> Vec<Pool> {
        self.state.pools.values().cloned().collect()
    }
}
