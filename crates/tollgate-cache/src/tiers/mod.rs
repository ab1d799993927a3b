//! Cache tier implementations.

pub(crate) mod memory;
mod sqlite;

pub use memory::{Lookup, MemoryTier};
pub use sqlite::SqliteTier;
