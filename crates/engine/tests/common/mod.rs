//! Shared harness for engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use hybrid_dex_data::MemoryStore;
use hybrid_dex_domain::prelude::*;
use hybrid_dex_engine::prelude::*;

pub const BEE: &str = "BEE";
pub const HIVE: &str = "SWAP.HIVE";
pub const ISSUER: &str = "issuer";

/// One whole token at 8 decimals.
pub const UNIT: u64 = 100_000_000;

pub fn amt(v: u64) -> TokenAmount {
    TokenAmount::from(v)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn genesis() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub struct Harness {
    pub engine: Engine<MemoryStore>,
    seq: i64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        init_tracing();
        Self {
            engine: Engine::new(MemoryStore::new(), config),
            seq: 0,
        }
    }

    /// BEE and SWAP.HIVE, both 8 decimals, issued by `ISSUER`.
    pub fn with_tokens() -> Self {
        let mut h = Self::new();
        h.create_token(BEE, 8);
        h.create_token(HIVE, 8);
        h
    }

    pub fn now(&self) -> DateTime<Utc> {
        genesis() + Duration::seconds(self.seq)
    }

    pub fn submit(&mut self, sender: &str, request: TradeRequest) -> Result<Receipt, Rejection> {
        self.seq += 1;
        let tx = Transaction::new(format!("tx-{}", self.seq), sender, self.now(), request);
        self.engine.apply(&tx)
    }

    pub fn ok(&mut self, sender: &str, request: TradeRequest) -> Receipt {
        match self.submit(sender, request) {
            Ok(receipt) => receipt,
            Err(rejection) => panic!("request rejected: {rejection}"),
        }
    }

    pub fn create_token(&mut self, symbol: &str, decimals: u8) {
        self.ok(
            ISSUER,
            TradeRequest::TokenCreate(TokenCreate {
                symbol: symbol.to_string(),
                decimals,
            }),
        );
    }

    pub fn fund(&mut self, account: &str, symbol: &str, amount: u64) {
        self.ok(
            ISSUER,
            TradeRequest::TokenIssue(TokenIssue {
                symbol: symbol.to_string(),
                to: account.to_string(),
                amount: amt(amount),
            }),
        );
    }

    pub fn create_pool(&mut self, a: &str, b: &str, fee_tier: u32) -> PoolId {
        match self.ok(
            ISSUER,
            TradeRequest::PoolCreate(PoolCreate {
                token_a_symbol: a.to_string(),
                token_a_issuer: ISSUER.to_string(),
                token_b_symbol: b.to_string(),
                token_b_issuer: ISSUER.to_string(),
                fee_tier,
            }),
        ) {
            Receipt::PoolCreated { pool_id } => pool_id,
            other => panic!("unexpected receipt {other:?}"),
        }
    }

    pub fn add_liquidity_request(pool_id: &PoolId, provider: &str, a: u64, b: u64) -> TradeRequest {
        TradeRequest::PoolAddLiquidity(AddLiquidity {
            pool_id: pool_id.clone(),
            provider: provider.to_string(),
            token_a_amount: amt(a),
            token_b_amount: amt(b),
        })
    }

    /// Funds `provider` and deposits `a`/`b` into `pool_id`.
    pub fn seed_pool(&mut self, pool_id: &PoolId, provider: &str, a: u64, b: u64) -> LiquidityReceipt {
        let pool = self.engine.query().get_pool(pool_id).unwrap();
        self.fund(provider, &pool.token_a, a);
        self.fund(provider, &pool.token_b, b);
        match self.ok(provider, Self::add_liquidity_request(pool_id, provider, a, b)) {
            Receipt::LiquidityAdded(r) => r,
            other => panic!("unexpected receipt {other:?}"),
        }
    }

    /// BEE/SWAP.HIVE pair, tick 1, lot 1, no minimum notional.
    pub fn create_pair(&mut self) -> PairId {
        match self.ok(
            ISSUER,
            TradeRequest::MarketCreatePair(CreatePair {
                base_asset_symbol: BEE.to_string(),
                quote_asset_symbol: HIVE.to_string(),
                tick_size: Price::from(1),
                lot_size: amt(1),
                min_notional: TokenAmount::zero(),
                initial_status: PairStatus::Trading,
            }),
        ) {
            Receipt::PairCreated { pair_id } => pair_id,
            other => panic!("unexpected receipt {other:?}"),
        }
    }

    pub fn limit_order(
        &mut self,
        owner: &str,
        pair_id: &PairId,
        side: OrderSide,
        price: u64,
        quantity: u64,
    ) -> Result<OrderReceipt, Rejection> {
        let receipt = self.submit(
            owner,
            TradeRequest::MarketPlaceOrder(PlaceOrder {
                pair_id: pair_id.clone(),
                side,
                order_type: OrderType::Limit,
                price: Some(Price::from(price)),
                quantity: amt(quantity),
                min_amount_out: None,
            }),
        )?;
        match receipt {
            Receipt::OrderPlaced(r) => Ok(r),
            other => panic!("unexpected receipt {other:?}"),
        }
    }

    pub fn hybrid(&mut self, trader: &str, trade: HybridTrade) -> Result<TradeReceipt, Rejection> {
        match self.submit(trader, TradeRequest::HybridTrade(trade))? {
            Receipt::Trade(r) => Ok(r),
            other => panic!("unexpected receipt {other:?}"),
        }
    }

    pub fn balance(&self, account: &str, symbol: &str) -> TokenAmount {
        self.engine.query().balance(account, symbol)
    }

    pub fn pool(&self, id: &PoolId) -> Pool {
        self.engine.query().get_pool(id).unwrap()
    }

    pub fn order(&self, id: &OrderId) -> Order {
        self.engine.store().order(id).unwrap()
    }
}

pub fn trade(token_in: &str, token_out: &str, amount_in: u64) -> HybridTrade {
    HybridTrade {
        token_in: token_in.to_string(),
        token_out: token_out.to_string(),
        amount_in: amt(amount_in),
        price: None,
        min_amount_out: None,
        max_slippage_percent: None,
        routes: None,
    }
}
