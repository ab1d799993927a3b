//! # tollgate-cache
//!
//! Two-tier read-through cache.
//!
//! - **Memory tier**: in-process `DashMap`, no I/O, bounded capacity with
//!   approximate-LRU eviction.
//! - **Durable tier**: anything implementing `ICacheTier`; SQLite in
//!   production, another memory tier in tests. Source of truth across restarts.
//!
//! Durable-tier failures never reach callers: they are logged and treated
//! as misses.

pub mod single_flight;
pub mod store;
pub mod tiers;

pub use single_flight::SingleFlight;
pub use store::{CacheStore, SweepReport};
pub use tiers::{MemoryTier, SqliteTier};
