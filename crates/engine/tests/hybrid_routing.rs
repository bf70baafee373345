//! Hybrid trades across pools and the order book.

mod common;

use common::*;
use hybrid_dex_domain::math::calculate_out_amount;
use hybrid_dex_domain::prelude::*;
use hybrid_dex_engine::prelude::*;

const DEEP: u64 = 1_000_000_000;

/// Deep BEE/SWAP.HIVE pool at parity plus an empty pair.
fn market_setup() -> (Harness, PoolId, PairId) {
    let mut h = Harness::with_tokens();
    let pool_id = h.create_pool(BEE, HIVE, 30);
    h.seed_pool(&pool_id, "lp", DEEP, DEEP);
    let pair_id = h.create_pair();
    (h, pool_id, pair_id)
}

fn amm_out(amount_in: u64, reserve_in: u64, reserve_out: u64) -> TokenAmount {
    calculate_out_amount(amt(amount_in), amt(reserve_in), amt(reserve_out), 30)
        .unwrap()
        .amount_out
}

fn amm_leg(allocation: u32, pool_id: &PoolId) -> RouteSpec {
    RouteSpec::Amm {
        allocation,
        details: AmmRoute {
            pool_id: pool_id.clone(),
        },
    }
}

fn book_leg(allocation: u32, pair_id: &PairId) -> RouteSpec {
    RouteSpec::Orderbook {
        allocation,
        details: OrderbookRoute {
            pair_id: pair_id.clone(),
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            price: None,
        },
    }
}

#[test]
fn test_explicit_split_between_pool_and_book() {
    let (mut h, pool_id, pair_id) = market_setup();
    h.fund("alice", BEE, 500_000);
    let ask = h.limit_order("alice", &pair_id, OrderSide::Sell, UNIT, 500_000).unwrap();
    h.fund("bob", HIVE, 1_000_000);

    let mut request = trade(HIVE, BEE, 1_000_000);
    request.routes = Some(vec![amm_leg(60, &pool_id), book_leg(40, &pair_id)]);
    let receipt = h.hybrid("bob", request).unwrap();

    let expected_amm = amm_out(600_000, DEEP, DEEP);
    assert_eq!(receipt.legs.len(), 2);
    assert_eq!(receipt.legs[0].route_type, RouteType::Amm);
    assert_eq!(receipt.legs[0].amount_in, amt(600_000));
    assert_eq!(receipt.legs[0].amount_out, expected_amm);
    assert_eq!(receipt.legs[0].fees, vec![amt(1_800)]);
    assert_eq!(receipt.legs[1].route_type, RouteType::Orderbook);
    assert_eq!(receipt.legs[1].amount_out, amt(400_000));
    assert_eq!(receipt.amount_out, expected_amm.checked_add(amt(400_000)).unwrap());
    assert_eq!(receipt.amount_used, amt(1_000_000));
    assert!(receipt.failure.is_none());

    assert!(h.balance("bob", HIVE).is_zero());
    assert_eq!(h.balance("bob", BEE), receipt.amount_out);
    assert_eq!(h.balance("alice", HIVE), amt(400_000));
    assert_eq!(h.order(&ask.order_id.unwrap()).remaining_quantity, amt(100_000));
    assert_eq!(h.pool(&pool_id).reserve_b, amt(DEEP + 600_000));
}

#[test]
fn test_explicit_routes_must_sum_to_hundred() {
    let (mut h, pool_id, pair_id) = market_setup();
    h.fund("bob", HIVE, 1_000);

    let mut request = trade(HIVE, BEE, 1_000);
    request.routes = Some(vec![amm_leg(60, &pool_id), book_leg(30, &pair_id)]);
    let rejection = h.hybrid("bob", request).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);
    assert!(rejection.partial.is_none());
    assert_eq!(h.balance("bob", HIVE), amt(1_000));
    assert_eq!(h.pool(&pool_id).reserve_b, amt(DEEP));
}

#[test]
fn test_explicit_route_to_unknown_pool() {
    let (mut h, _, _) = market_setup();
    h.fund("bob", HIVE, 1_000);
    let mut request = trade(HIVE, BEE, 1_000);
    request.routes = Some(vec![amm_leg(100, &PoolId::new(BEE, HIVE, 5))]);
    let rejection = h.hybrid("bob", request).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::Validation);
}

#[test]
fn test_limit_trade_matches_then_rests() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 200);
    h.limit_order("alice", &pair_id, OrderSide::Sell, 150_000_000, 200).unwrap();
    h.fund("bob", HIVE, 1_000);

    let mut request = trade(HIVE, BEE, 1_000);
    request.price = Some(Price::from(2 * UNIT));
    let receipt = h.hybrid("bob", request).unwrap();

    // 500 BEE affordable at 2.0: 200 fill at 1.5, 300 rest at 2.0
    assert_eq!(receipt.legs.len(), 1);
    assert_eq!(receipt.amount_out, amt(200));
    assert_eq!(receipt.amount_used, amt(900));
    let resting_id = receipt.resting_order_id.expect("remainder rests");
    let resting = h.order(&resting_id);
    assert_eq!(resting.status, OrderStatus::PartiallyFilled);
    assert_eq!(resting.remaining_quantity, amt(300));
    assert_eq!(resting.escrow, amt(600));
    assert_eq!(h.balance("bob", HIVE), amt(100));
    assert_eq!(h.balance("alice", HIVE), amt(300));
}

#[test]
fn test_auto_route_uses_book_without_pools() {
    let mut h = Harness::with_tokens();
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 1_000_000);
    h.limit_order("alice", &pair_id, OrderSide::Sell, 90_000_000, 1_000_000).unwrap();
    h.fund("bob", HIVE, 450_000);

    let receipt = h.hybrid("bob", trade(HIVE, BEE, 450_000)).unwrap();
    assert_eq!(receipt.legs.len(), 1);
    assert_eq!(receipt.legs[0].route_type, RouteType::Orderbook);
    assert_eq!(receipt.amount_out, amt(500_000));
    assert!(receipt.resting_order_id.is_none());
    assert!(h.balance("bob", HIVE).is_zero());
}

#[test]
fn test_auto_route_splits_when_book_is_cheaper() {
    let (mut h, pool_id, pair_id) = market_setup();
    h.fund("alice", BEE, 100_000);
    h.limit_order("alice", &pair_id, OrderSide::Sell, 90_000_000, 100_000).unwrap();
    h.fund("bob", HIVE, 1_000_000);

    let receipt = h.hybrid("bob", trade(HIVE, BEE, 1_000_000)).unwrap();
    let expected_amm = amm_out(900_000, DEEP, DEEP);
    assert_eq!(receipt.legs.len(), 2);
    assert_eq!(receipt.legs[0].route_type, RouteType::Amm);
    assert_eq!(receipt.legs[0].amount_in, amt(900_000));
    assert_eq!(receipt.legs[1].route_type, RouteType::Orderbook);
    assert_eq!(receipt.legs[1].amount_in, amt(100_000));
    assert_eq!(receipt.legs[1].amount_used, amt(90_000));
    assert_eq!(receipt.amount_out, expected_amm.checked_add(amt(100_000)).unwrap());
    assert!(receipt.amount_out > amm_out(1_000_000, DEEP, DEEP));

    // the book leg did not need its whole budget
    assert_eq!(h.balance("bob", HIVE), amt(10_000));
    assert_eq!(h.pool(&pool_id).reserve_b, amt(DEEP + 900_000));
}

#[test]
fn test_auto_route_prefers_single_pool_when_book_is_worse() {
    let (mut h, _, pair_id) = market_setup();
    h.fund("alice", BEE, 100_000);
    h.limit_order("alice", &pair_id, OrderSide::Sell, 2 * UNIT, 100_000).unwrap();
    h.fund("bob", HIVE, 10_000);

    let receipt = h.hybrid("bob", trade(HIVE, BEE, 10_000)).unwrap();
    assert_eq!(receipt.legs.len(), 1);
    assert_eq!(receipt.legs[0].route_type, RouteType::Amm);
    assert_eq!(receipt.amount_out, amm_out(10_000, DEEP, DEEP));
}

#[test]
fn test_auto_route_min_amount_out() {
    let (mut h, _, _) = market_setup();
    h.fund("bob", HIVE, 10_000);
    let expected = amm_out(10_000, DEEP, DEEP);

    let mut request = trade(HIVE, BEE, 10_000);
    request.min_amount_out = Some(expected.checked_add(amt(1)).unwrap());
    let rejection = h.hybrid("bob", request).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::SlippageExceeded);

    let mut request = trade(HIVE, BEE, 10_000);
    request.min_amount_out = Some(expected);
    assert_eq!(h.hybrid("bob", request).unwrap().amount_out, expected);
}

#[test]
fn test_auto_route_without_liquidity() {
    let mut h = Harness::with_tokens();
    h.fund("bob", HIVE, 10_000);
    let rejection = h.hybrid("bob", trade(HIVE, BEE, 10_000)).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::InsufficientLiquidity);
}

#[test]
fn test_slippage_bound_on_thin_pool() {
    let mut h = Harness::with_tokens();
    let pool_id = h.create_pool(BEE, HIVE, 30);
    h.seed_pool(&pool_id, "lp", 100_000, 100_000);
    h.fund("bob", HIVE, 10_000);

    // about 9% price impact against the default 1% bound
    let rejection = h.hybrid("bob", trade(HIVE, BEE, 10_000)).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::SlippageExceeded);

    let mut request = trade(HIVE, BEE, 10_000);
    request.max_slippage_percent = Some(BasisPoints::new(1_500).unwrap());
    let receipt = h.hybrid("bob", request).unwrap();
    assert_eq!(receipt.amount_out, amm_out(10_000, 100_000, 100_000));
}

#[test]
fn test_failed_leg_rolls_back_whole_trade() {
    let (mut h, pool_id, pair_id) = market_setup();
    h.fund("bob", HIVE, 1_000);

    let mut request = trade(HIVE, BEE, 1_000);
    request.routes = Some(vec![amm_leg(50, &pool_id), book_leg(50, &pair_id)]);
    let rejection = h.hybrid("bob", request).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::InsufficientLiquidity);
    assert!(rejection.partial.is_none());
    assert_eq!(h.balance("bob", HIVE), amt(1_000));
    assert!(h.balance("bob", BEE).is_zero());
    assert_eq!(h.pool(&pool_id).reserve_b, amt(DEEP));
}

#[test]
fn test_failed_leg_keeps_executed_legs_when_not_atomic() {
    let mut h = Harness::with_config(EngineConfig::default().with_atomic_trades(false));
    h.create_token(BEE, 8);
    h.create_token(HIVE, 8);
    let pool_id = h.create_pool(BEE, HIVE, 30);
    h.seed_pool(&pool_id, "lp", DEEP, DEEP);
    let pair_id = h.create_pair();
    h.fund("bob", HIVE, 1_000);

    let mut request = trade(HIVE, BEE, 1_000);
    request.routes = Some(vec![amm_leg(50, &pool_id), book_leg(50, &pair_id)]);
    let rejection = h.hybrid("bob", request).unwrap_err();
    assert_eq!(rejection.kind, ErrorKind::InsufficientLiquidity);

    let partial = rejection.partial.expect("executed legs are reported");
    assert_eq!(partial.legs.len(), 1);
    let failure = partial.failure.expect("failed leg is reported");
    assert_eq!(failure.leg_index, 1);
    assert_eq!(h.balance("bob", HIVE), amt(500));
    assert_eq!(h.balance("bob", BEE), partial.amount_out);
    assert_eq!(h.pool(&pool_id).reserve_b, amt(DEEP + 500));
}

/// Thin parity pool next to a single ask of 9,000 BEE at about 1.1111 HIVE.
fn thin_pool_and_ask() -> (Harness, PoolId) {
    let mut h = Harness::with_tokens();
    let pool_id = h.create_pool(BEE, HIVE, 30);
    h.seed_pool(&pool_id, "lp", 100_000, 100_000);
    let pair_id = h.create_pair();
    h.fund("alice", BEE, 9_000);
    h.limit_order("alice", &pair_id, OrderSide::Sell, 111_111_112, 9_000).unwrap();
    h.fund("bob", HIVE, 10_000);
    (h, pool_id)
}

#[test]
fn test_auto_route_skips_splits_that_break_the_default_bound() {
    let (mut h, pool_id) = thin_pool_and_ask();

    // the best raw output is a 50/50 split, but its pool leg loses ~5%
    let receipt = h.hybrid("bob", trade(HIVE, BEE, 10_000)).unwrap();
    assert_eq!(receipt.legs.len(), 1);
    assert_eq!(receipt.legs[0].route_type, RouteType::Orderbook);
    assert_eq!(receipt.amount_out, amt(8_999));
    assert_eq!(h.pool(&pool_id).reserve_b, amt(100_000));
    assert_eq!(
        h.balance("bob", HIVE).checked_add(receipt.amount_used).unwrap(),
        amt(10_000)
    );
}

#[test]
fn test_auto_route_picks_best_split_within_explicit_bound() {
    let (mut h, pool_id) = thin_pool_and_ask();

    let mut request = trade(HIVE, BEE, 10_000);
    request.max_slippage_percent = Some(BasisPoints::new(200).unwrap());
    let receipt = h.hybrid("bob", request).unwrap();

    // 20% through the pool is the largest share within 2%
    assert_eq!(receipt.legs.len(), 2);
    assert_eq!(receipt.legs[0].route_type, RouteType::Amm);
    assert_eq!(receipt.legs[0].amount_in, amt(2_000));
    assert_eq!(receipt.legs[0].amount_out, amm_out(2_000, 100_000, 100_000));
    assert_eq!(receipt.legs[1].route_type, RouteType::Orderbook);
    assert_eq!(receipt.legs[1].amount_in, amt(8_000));
    assert_eq!(receipt.legs[1].amount_out, amt(7_199));
    assert_eq!(
        receipt.amount_out,
        amm_out(2_000, 100_000, 100_000).checked_add(amt(7_199)).unwrap()
    );
    assert_eq!(h.pool(&pool_id).reserve_b, amt(102_000));
}

#[test]
fn test_auto_route_through_a_pool_twice_conserves_tokens() {
    let mut h = Harness::with_config(EngineConfig::default().with_max_hops(5));
    for symbol in ["AAA", "BBB", "CCC", "DDD"] {
        h.create_token(symbol, 8);
    }
    let ab = h.create_pool("AAA", "BBB", 30);
    let bc = h.create_pool("BBB", "CCC", 30);
    let ac = h.create_pool("AAA", "CCC", 30);
    let bd = h.create_pool("BBB", "DDD", 30);
    h.seed_pool(&ab, "lp", 1_000_000, 1_000_000);
    h.seed_pool(&bc, "lp", 1_000_000, 1_000_000);
    // CCC is worth two AAA here, so AAA -> BBB -> CCC -> AAA gains AAA
    h.seed_pool(&ac, "lp", 2_000_000, 1_000_000);
    h.seed_pool(&bd, "lp", 1_000_000, 1_000_000);
    h.fund("bob", "AAA", 1_000);

    let held = |h: &Harness, symbol: &str| {
        h.engine
            .query()
            .list_pools()
            .iter()
            .fold(h.balance("bob", symbol).0, |acc, pool| {
                if pool.token_a == symbol {
                    acc + pool.reserve_a.0
                } else if pool.token_b == symbol {
                    acc + pool.reserve_b.0
                } else {
                    acc
                }
            })
    };
    let before: Vec<_> = ["AAA", "BBB", "CCC", "DDD"].iter().map(|s| held(&h, s)).collect();

    let mut request = trade("AAA", "DDD", 1_000);
    request.max_slippage_percent = Some(BasisPoints::new(500).unwrap());
    let receipt = h.hybrid("bob", request).unwrap();

    let leg = &receipt.legs[0];
    assert_eq!(leg.venues.len(), 5);
    assert_eq!(leg.venues[0], Venue::Pool(ab.clone()));
    assert_eq!(leg.venues[3], Venue::Pool(ab.clone()));
    assert_eq!(leg.trade_ids.len(), 5);

    let after: Vec<_> = ["AAA", "BBB", "CCC", "DDD"].iter().map(|s| held(&h, s)).collect();
    assert_eq!(before, after);
    assert!(h.balance("bob", "AAA").is_zero());
    assert_eq!(h.balance("bob", "DDD"), receipt.amount_out);
    // both passes through AAA/BBB landed in its reserves
    assert!(h.pool(&ab).reserve_a > amt(1_002_000));
}
