//! Limit order book: price/time matching with escrowed custody.

pub mod book;
pub mod matching;

pub use book::{DepthLevel, DepthSnapshot, FillPlan, OrderBook, PlannedFill, TakerLimits};
pub use matching::{MatchingEngine, TakerOrder};
