//! Storage adapters for the hybrid DEX engine.
//!
//! [`MemoryStore`] keeps every collection in ordered maps and implements
//! the domain repository ports, transaction boundaries included. It backs
//! tests, replays and single-node deployments; snapshots serialize to JSON.

/// Repository implementations.
pub mod repositories;

pub use repositories::{MemoryStore, Snapshot};
