//! Deterministic settlement engine for a hybrid AMM / order-book exchange.
//!
//! This crate turns consensus-ordered transactions into state changes:
//! - Constant-product pools with pro-rata liquidity shares
//! - Swap fee accrual through fee-per-share accumulators
//! - Breadth-first multi-hop route discovery
//! - A price/time priority order book with escrowed custody
//! - Hybrid routing that splits a trade between pools and the book
//!
//! State lives behind the [`hybrid_dex_domain::repositories::Store`] ports;
//! the engine holds only its configuration.

/// Prelude module for convenient imports.
pub mod prelude;

/// Engine configuration.
pub mod config;
/// Per-transaction context.
pub mod context;
/// Transaction entry point.
pub mod engine;
/// Errors and rejections.
pub mod error;
/// Fee accrual and settlement.
pub mod fee_accountant;
mod guards;
/// Order book matching.
pub mod order_book;
/// Pool state transitions.
pub mod pool_ledger;
/// Read-only queries.
pub mod query;
/// Transaction results.
pub mod receipt;
/// Transaction payloads.
pub mod request;
/// Route discovery.
pub mod route_finder;
/// Hybrid trade routing.
pub mod router;
/// Token registration.
pub mod tokens;
