//! In-memory store
//!
//! Used for tests, demos and offline runs. Seedable from a JSON snapshot.

pub mod seed;
pub mod store;

pub use seed::MemorySeed;
pub use store::{BulkFault, MemoryStore};
