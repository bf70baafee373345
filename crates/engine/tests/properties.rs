//! Property tests over random request sequences.
//!
//! 1. **Token conservation**: supply equals balances plus reserves plus escrow.
//! 2. **Pool invariant**: `k` never decreases under swaps.
//! 3. **Fee closure**: providers are never owed more than the pool charged.
//! 4. **Order accounting**: `filled + remaining == quantity`, escrow matches
//!    what the order can still owe.
//! 5. **Route monotonicity**: more input never yields less output.
//! 6. **Allocation exactness**: explicit splits add up to the input.

mod common;

use chrono::Utc;
use common::*;
use hybrid_dex_domain::math::calculate_k;
use hybrid_dex_domain::prelude::*;
use hybrid_dex_engine::prelude::*;
use hybrid_dex_engine::router::split_allocations;
use primitive_types::U512;
use proptest::prelude::*;

const TRADERS: [&str; 2] = ["alice", "bob"];

#[derive(Debug, Clone)]
enum Action {
    Swap { trader: usize, sell_bee: bool, amount: u64 },
    Limit { trader: usize, side: OrderSide, price: u64, quantity: u64 },
    Cancel { trader: usize, nth: usize },
    Hybrid { trader: usize, direction: usize, amount: u64 },
}

const DEC: &str = "DEC";
const SYMBOLS: [&str; 3] = [BEE, HIVE, DEC];

/// Every ordered pair of the three tokens.
const DIRECTIONS: [(&str, &str); 6] = [
    (BEE, HIVE),
    (HIVE, BEE),
    (BEE, DEC),
    (DEC, BEE),
    (HIVE, DEC),
    (DEC, HIVE),
];

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (0usize..2, any::<bool>(), 1u64..50_000)
            .prop_map(|(trader, sell_bee, amount)| Action::Swap { trader, sell_bee, amount }),
        (0usize..2, any::<bool>(), 5u64..=20, 1u64..5_000).prop_map(
            |(trader, buy, tenths, quantity)| Action::Limit {
                trader,
                side: if buy { OrderSide::Buy } else { OrderSide::Sell },
                price: tenths * 10_000_000,
                quantity,
            }
        ),
        (0usize..2, 0usize..8).prop_map(|(trader, nth)| Action::Cancel { trader, nth }),
        (0usize..2, 0usize..DIRECTIONS.len(), 1u64..20_000)
            .prop_map(|(trader, direction, amount)| Action::Hybrid { trader, direction, amount }),
    ]
}

struct Market {
    h: Harness,
    pool_id: PoolId,
    pair_id: PairId,
}

/// BEE/SWAP.HIVE pool and pair, plus DEC pools on both sides so hybrid
/// trades can take multi-hop and revisiting paths.
fn market() -> Market {
    let mut h = Harness::with_config(EngineConfig::default().with_max_hops(5));
    for symbol in SYMBOLS {
        h.create_token(symbol, 8);
    }
    let pool_id = h.create_pool(BEE, HIVE, 30);
    h.seed_pool(&pool_id, "lp", 10_000_000, 10_000_000);
    let bee_dec = h.create_pool(BEE, DEC, 30);
    h.seed_pool(&bee_dec, "lp", 5_000_000, 10_000_000);
    let dec_hive = h.create_pool(DEC, HIVE, 30);
    h.seed_pool(&dec_hive, "lp", 10_000_000, 5_000_000);
    let pair_id = h.create_pair();
    for trader in TRADERS {
        for symbol in SYMBOLS {
            h.fund(trader, symbol, 1_000_000);
        }
    }
    Market { h, pool_id, pair_id }
}

fn tokens(sell_bee: bool) -> (&'static str, &'static str) {
    if sell_bee { (BEE, HIVE) } else { (HIVE, BEE) }
}

/// Applies `action`; rejections are part of the exercise.
fn run(m: &mut Market, action: &Action) {
    let _ = match action {
        Action::Swap { trader, sell_bee, amount } => {
            let (token_in, token_out) = tokens(*sell_bee);
            m.h.submit(
                TRADERS[*trader],
                TradeRequest::PoolSwap(PoolSwap {
                    pool_id: m.pool_id.clone(),
                    trader: TRADERS[*trader].to_string(),
                    token_in_symbol: token_in.to_string(),
                    token_out_symbol: token_out.to_string(),
                    amount_in: amt(*amount),
                    min_amount_out: TokenAmount::zero(),
                }),
            )
        }
        Action::Limit { trader, side, price, quantity } => m
            .h
            .limit_order(TRADERS[*trader], &m.pair_id, *side, *price, *quantity)
            .map(Receipt::OrderPlaced),
        Action::Cancel { trader, nth } => {
            let owner = TRADERS[*trader];
            let resting: Vec<Order> = m
                .h
                .engine
                .query()
                .user_orders(owner, None)
                .into_iter()
                .filter(Order::is_resting)
                .collect();
            if resting.is_empty() {
                return;
            }
            let order = &resting[nth % resting.len()];
            m.h.submit(
                owner,
                TradeRequest::MarketCancelOrder(CancelOrder {
                    user_id: owner.to_string(),
                    order_id: order.id,
                    pair_id: m.pair_id.clone(),
                }),
            )
        }
        Action::Hybrid { trader, direction, amount } => {
            let (token_in, token_out) = DIRECTIONS[*direction];
            m.h.hybrid(TRADERS[*trader], trade(token_in, token_out, *amount))
                .map(Receipt::Trade)
        }
    };
}

fn check_conservation(m: &Market) -> Result<(), TestCaseError> {
    let state = m.h.engine.store().snapshot();
    for symbol in SYMBOLS {
        let supply = state.tokens[symbol].supply;
        let mut held = U256::zero();
        for balances in state.balances.values() {
            if let Some(balance) = balances.get(symbol) {
                held += balance.0;
            }
        }
        for pool in state.pools.values() {
            if pool.token_a == symbol {
                held += pool.reserve_a.0;
            } else if pool.token_b == symbol {
                held += pool.reserve_b.0;
            }
        }
        for order in state.orders.values() {
            let pair = &state.pairs[&order.pair_id];
            let escrow_token = match order.side {
                OrderSide::Buy => &pair.quote,
                OrderSide::Sell => &pair.base,
            };
            if escrow_token == symbol {
                held += order.escrow.0;
            }
        }
        prop_assert_eq!(supply.0, held, "{} is not conserved", symbol);
    }
    Ok(())
}

fn check_orders(m: &Market) -> Result<(), TestCaseError> {
    let state = m.h.engine.store().snapshot();
    for order in state.orders.values() {
        prop_assert_eq!(
            order.filled_quantity.checked_add(order.remaining_quantity).unwrap(),
            order.quantity
        );
        if !order.is_resting() {
            prop_assert!(order.escrow.is_zero(), "terminal order {} holds escrow", order.id);
            continue;
        }
        prop_assert!(!order.remaining_quantity.is_zero());
        match order.side {
            OrderSide::Sell => prop_assert_eq!(order.escrow, order.remaining_quantity),
            OrderSide::Buy => {
                let pair = &state.pairs[&order.pair_id];
                let owed = pair
                    .notional(order.remaining_quantity, order.price.unwrap())
                    .unwrap();
                prop_assert!(order.escrow >= owed);
            }
        }
    }
    Ok(())
}

fn check_fees(m: &Market) -> Result<(), TestCaseError> {
    let views = m.h.engine.query().user_positions("lp").unwrap();
    for pool in m.h.engine.query().list_pools() {
        let mine = views.iter().filter(|v| v.position.pool_id == pool.id);
        let (owed_a, owed_b) = mine.fold((U256::zero(), U256::zero()), |(a, b), v| {
            (a + v.claimable_fees_a.0, b + v.claimable_fees_b.0)
        });
        prop_assert!(owed_a <= pool.total_fees_a.0);
        prop_assert!(owed_b <= pool.total_fees_b.0);
    }
    Ok(())
}

fn pool_ks(m: &Market) -> Vec<(PoolId, U512)> {
    m.h.engine
        .query()
        .list_pools()
        .into_iter()
        .map(|p| (p.id.clone(), calculate_k(p.reserve_a, p.reserve_b)))
        .collect()
}

fn pool_with(token_x: &str, token_y: &str, rx: u64, ry: u64) -> Pool {
    let mut pool = Pool::new(token_x, token_y, 30, Utc::now());
    let (ra, rb) = if pool.token_a == token_x { (rx, ry) } else { (ry, rx) };
    pool.reserve_a = amt(ra);
    pool.reserve_b = amt(rb);
    pool.total_shares = amt(1_000);
    pool
}

fn allocations() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::btree_set(1u32..100, 0..6).prop_map(|cuts| {
        let mut bounds: Vec<u32> = vec![0];
        bounds.extend(cuts);
        bounds.push(100);
        bounds.windows(2).map(|w| w[1] - w[0]).collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_random_activity_keeps_ledgers_consistent(
        actions in proptest::collection::vec(action(), 1..25)
    ) {
        let mut m = market();
        for action in &actions {
            let before = pool_ks(&m);
            run(&mut m, action);
            let after = pool_ks(&m);
            for ((id, k_before), (_, k_after)) in before.iter().zip(&after) {
                prop_assert!(k_after >= k_before, "k of {} decreased after {:?}", id, action);
            }
            check_conservation(&m)?;
            check_orders(&m)?;
            check_fees(&m)?;
        }
    }

    #[test]
    fn prop_more_input_never_yields_less(
        direct in (1_000u64..1_000_000_000_000, 1_000u64..1_000_000_000_000),
        first in (1_000u64..1_000_000_000_000, 1_000u64..1_000_000_000_000),
        second in (1_000u64..1_000_000_000_000, 1_000u64..1_000_000_000_000),
        amount in 1u64..1_000_000_000,
        extra in 0u64..1_000_000_000,
    ) {
        let pools = vec![
            pool_with(BEE, HIVE, direct.0, direct.1),
            pool_with(BEE, "DEC", first.0, first.1),
            pool_with("DEC", HIVE, second.0, second.1),
        ];
        let best = |amount: u64| {
            find_routes(&pools, BEE, HIVE, amt(amount), 3)
                .unwrap()
                .next()
                .map(|route| route.amount_out)
                .unwrap_or_default()
        };
        prop_assert!(best(amount + extra) >= best(amount));
    }

    #[test]
    fn prop_allocations_add_up(
        amount in 1u64..u64::MAX,
        allocations in allocations(),
    ) {
        let parts = split_allocations(amt(amount), &allocations).unwrap();
        prop_assert_eq!(parts.len(), allocations.len());
        let total = parts.iter().fold(U256::zero(), |acc, p| acc + p.0);
        prop_assert_eq!(total, U256::from(amount));
        for (part, allocation) in parts.iter().zip(&allocations).take(parts.len() - 1) {
            prop_assert_eq!(part.0, U256::from(amount) * U256::from(*allocation) / U256::from(100u8));
        }
    }
}
