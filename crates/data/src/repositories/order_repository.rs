//! Order persistence and book-priority lookups.

use super::MemoryStore;
use hybrid_dex_domain::entities::{Order, OrderId, PairId};
use hybrid_dex_domain::enums::{OrderSide, OrderStatus};
use hybrid_dex_domain::repositories::OrderRepository;
use std::cmp::Ordering;

impl OrderRepository for MemoryStore {
    fn order(&self, id: &OrderId) -> Option<Order> {
        self.state.orders.get(id).cloned()
    }

    fn save_order(&mut self, order: Order) {
        self.journal(|c, s| c.order(s, order.id));
        self.state.orders.insert(order.id, order);
    }

    fn resting_orders(&self, pair_id: &PairId, side: OrderSide) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .values()
            .filter(|o| &o.pair_id == pair_id && o.side == side && o.is_resting())
            .cloned()
            .collect();
        orders.sort_by(|a, b| priority(side, a, b));
        orders
    }

    fn orders_by_pair(&self, pair_id: &PairId, status: Option<OrderStatus>) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .values()
            .filter(|o| &o.pair_id == pair_id && status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.sequence);
        orders
    }

    fn orders_by_owner(&self, owner: &str, status: Option<OrderStatus>) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .values()
            .filter(|o| o.owner == owner && status.is_none_or(|s| o.status == s))
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.sequence);
        orders
    }

    fn next_order_sequence(&mut self) -> u64 {
        self.state.order_sequence += 1;
        self.state.order_sequence
    }
}

/// Best price first (lowest ask, highest bid), then arrival order.
fn priority(side: OrderSide, a: &Order, b: &Order) -> Ordering {
    let by_price = match side {
        OrderSide::Sell => a.price.cmp(&b.price),
        OrderSide::Buy => b.price.cmp(&a.price),
    };
    by_price.then(a.sequence.cmp(&b.sequence))
}
