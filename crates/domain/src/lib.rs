//! Domain model of the hybrid exchange settlement core.
//!
//! This crate holds everything that is pure and deterministic:
//! - Raw token amounts and prices over `U256` with decimal-string serde
//! - Fixed-point parsing/formatting and wide `mul_div`
//! - Constant product pool math and fee-per-share accumulators
//! - Pools, liquidity positions, orders, trading pairs and trades
//! - Repository and balance-ledger ports implemented by the storage layer

/// Pools, positions, orders, trading pairs and trades.
pub mod entities;
/// Order, pair and route enums.
pub mod enums;
/// Error types.
pub mod error;
/// Fee growth accumulator math.
pub mod fees;
/// Fixed-point and constant product math.
pub mod math;
/// Prelude module for convenient imports.
pub mod prelude;
/// Persistence and ledger ports.
pub mod repositories;
/// Decimal-string serde adapter for `U256`.
pub mod serde_u256;
/// Token metadata and amounts.
pub mod token;
/// Prices and basis points.
pub mod value_objects;

pub use primitive_types::U256;
