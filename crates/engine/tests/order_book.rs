//! Limit and market order flow through the engine.

mod common;

use common::*;
use hybrid_dex_domain::prelude::*;
use hybrid_dex_engine::prelude::*;

const PRICE_150: u64 = 15_000_000_000;

fn cancel(owner: &str, pair_id: &PairId, order_id: OrderId) -> TradeRequest {
    TradeRequest::MarketCancelOrder(CancelOrder {
        user_id: owner.to_string(),
        order_id,
        pair_id: pair_id.clone(),
    })
}

fn market(pair_id: &PairId, side: OrderSide, quantity: u64, min_out: Option<u64>) -> TradeRequest {
    TradeRequest::MarketPlaceOrder(PlaceOrder {
        pair_id: pair_id.clone(),
        side,
        order_type: OrderType::Market,
        price: None,
        quantity: amt(quantity),
        min_amount_out: min_out.map(amt),
    })
}

#[test]
fn test_maker_filled_across_two_takers() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, UNIT);
    h.fund("bob", HIVE, 200 * UNIT);
    h.fund("carol", HIVE, 200 * UNIT);

    let ask = h.limit_order("alice", &pair_id, OrderSide::Sell, PRICE_150, UNIT).unwrap();
    let ask_id = ask.order_id.unwrap();
    assert_eq!(ask.status, OrderStatus::Open);
    assert_eq!(ask.escrowed, amt(UNIT));
    assert!(h.balance("alice", BEE).is_zero());

    let first = h.limit_order("bob", &pair_id, OrderSide::Buy, PRICE_150, 70_000_000).unwrap();
    assert_eq!(first.status, OrderStatus::Filled);
    assert_eq!(first.fills.len(), 1);
    assert_eq!(first.fills[0].quote_amount, amt(10_500_000_000));
    assert_eq!(h.balance("bob", BEE), amt(70_000_000));
    assert_eq!(h.balance("bob", HIVE), amt(200 * UNIT - 10_500_000_000));

    let resting = h.order(&ask_id);
    assert_eq!(resting.status, OrderStatus::PartiallyFilled);
    assert_eq!(resting.remaining_quantity, amt(30_000_000));
    assert_eq!(resting.escrow, amt(30_000_000));

    let second = h.limit_order("carol", &pair_id, OrderSide::Buy, PRICE_150, 30_000_000).unwrap();
    assert_eq!(second.fills[0].quote_amount, amt(4_500_000_000));

    let done = h.order(&ask_id);
    assert_eq!(done.status, OrderStatus::Filled);
    assert!(done.escrow.is_zero());
    assert_eq!(h.balance("alice", HIVE), amt(15_000_000_000));

    // taker limit orders are recorded even when fully filled
    let bob_orders = h.engine.query().user_orders("bob", Some(OrderStatus::Filled));
    assert_eq!(bob_orders.len(), 1);
    assert_eq!(bob_orders[0].filled_quantity, amt(70_000_000));
}

#[test]
fn test_unfilled_limit_remainder_rests_with_escrow() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 1_000);
    h.fund("bob", HIVE, 10_000);

    h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 1_000).unwrap();
    let bid = h.limit_order("bob", &pair_id, OrderSide::Buy, UNIT, 2_500).unwrap();
    assert_eq!(bid.status, OrderStatus::PartiallyFilled);
    assert_eq!(bid.filled_quantity, amt(1_000));
    assert_eq!(bid.escrowed, amt(1_500));
    assert_eq!(h.balance("bob", HIVE), amt(7_500));

    let order = h.order(&bid.order_id.unwrap());
    assert_eq!(order.remaining_quantity, amt(1_500));
    assert_eq!(order.filled_quantity.checked_add(order.remaining_quantity).unwrap(), order.quantity);

    let depth = h.engine.query().order_book_depth(&pair_id, 10).unwrap();
    assert!(depth.asks.is_empty());
    assert_eq!(depth.bids.len(), 1);
    assert_eq!(depth.bids[0].quantity, amt(1_500));
}

#[test]
fn test_price_time_priority() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    for maker in ["early", "late", "cheap"] {
        h.fund(maker, BEE, 100);
    }
    h.fund("taker", HIVE, UNIT);

    let early = h.limit_order("early", &pair_id, OrderSide::Sell, 2 * UNIT, 100).unwrap();
    let late = h.limit_order("late", &pair_id, OrderSide::Sell, 2 * UNIT, 100).unwrap();
    let cheap = h.limit_order("cheap", &pair_id, OrderSide::Sell, UNIT, 100).unwrap();

    let taken = h.limit_order("taker", &pair_id, OrderSide::Buy, 2 * UNIT, 150).unwrap();
    let makers: Vec<OrderId> = taken.fills.iter().map(|f| f.maker_order_id).collect();
    assert_eq!(makers, vec![cheap.order_id.unwrap(), early.order_id.unwrap()]);
    // fills execute at the maker's price
    assert_eq!(taken.fills[0].quote_amount, amt(100));
    assert_eq!(taken.fills[1].quote_amount, amt(100));
    assert_eq!(h.order(&late.order_id.unwrap()).status, OrderStatus::Open);
}

#[test]
fn test_cancel_refunds_and_is_idempotent() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("bob", HIVE, 5_000);
    let bid = h.limit_order("bob", &pair_id, OrderSide::Buy, 2 * UNIT, 1_000).unwrap();
    let id = bid.order_id.unwrap();
    assert_eq!(h.balance("bob", HIVE), amt(3_000));

    let Receipt::OrderCancelled(first) = h.ok("bob", cancel("bob", &pair_id, id)) else {
        panic!("expected cancel receipt");
    };
    assert!(first.cancelled);
    assert_eq!(first.refunded, amt(2_000));
    assert_eq!(h.balance("bob", HIVE), amt(5_000));
    assert_eq!(h.order(&id).status, OrderStatus::Cancelled);

    let Receipt::OrderCancelled(again) = h.ok("bob", cancel("bob", &pair_id, id)) else {
        panic!("expected cancel receipt");
    };
    assert!(!again.cancelled);
    assert!(again.refunded.is_zero());
    assert_eq!(h.balance("bob", HIVE), amt(5_000));

    let unknown = OrderId::derive("tx-missing", 0);
    let Receipt::OrderCancelled(missing) = h.ok("bob", cancel("bob", &pair_id, unknown)) else {
        panic!("expected cancel receipt");
    };
    assert!(!missing.cancelled);
}

#[test]
fn test_cancel_someone_elses_order() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 100);
    let ask = h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 100).unwrap();
    let id = ask.order_id.unwrap();

    let rejection = h.submit("mallory", cancel("alice", &pair_id, id)).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);
    let rejection = h.submit("mallory", cancel("mallory", &pair_id, id)).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);
    assert_eq!(h.order(&id).status, OrderStatus::Open);
}

#[test]
fn test_halted_pair_accepts_cancels_only() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 200);
    let ask = h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 100).unwrap();

    h.ok(
        ISSUER,
        TradeRequest::MarketSetPairStatus(SetPairStatus {
            pair_id: pair_id.clone(),
            status: PairStatus::Halted,
        }),
    );
    let rejection = h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 100).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);

    let Receipt::OrderCancelled(receipt) =
        h.ok("alice", cancel("alice", &pair_id, ask.order_id.unwrap()))
    else {
        panic!("expected cancel receipt");
    };
    assert!(receipt.cancelled);
    assert_eq!(h.balance("alice", BEE), amt(200));
}

#[test]
fn test_market_orders() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 1_000);
    h.fund("bob", HIVE, 10_000);

    let rejection = h.submit("bob", market(&pair_id, OrderSide::Buy, 100, None)).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);

    // empty book
    let rejection = h.submit("bob", market(&pair_id, OrderSide::Buy, 100, Some(1))).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::InsufficientLiquidity);

    h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 1_000).unwrap();
    let rejection = h.submit("bob", market(&pair_id, OrderSide::Buy, 100, Some(101))).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::SlippageExceeded);
    assert_eq!(h.balance("bob", HIVE), amt(10_000));

    let Receipt::OrderPlaced(receipt) = h.ok("bob", market(&pair_id, OrderSide::Buy, 100, Some(100))) else {
        panic!("expected order receipt");
    };
    assert!(receipt.order_id.is_none());
    assert_eq!(receipt.status, OrderStatus::Filled);
    assert_eq!(receipt.amount_received, amt(100));
    assert!(h.engine.query().user_orders("bob", None).is_empty());
}

#[test]
fn test_order_rules_and_balances() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("bob", HIVE, 100);

    // needs 200 quote in escrow
    let rejection = h.limit_order("bob", &pair_id, OrderSide::Buy, 2 * UNIT, 100).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::InsufficientBalance);

    let rejection = h.limit_order("bob", &pair_id, OrderSide::Buy, UNIT, 0).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);

    let unknown = PairId::new("BEE", "DEC");
    let rejection = h.limit_order("bob", &unknown, OrderSide::Buy, UNIT, 10).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::NotFound);
    assert_eq!(h.balance("bob", HIVE), amt(100));
}
