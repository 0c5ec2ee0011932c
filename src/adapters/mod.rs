//! Store backends for hubtrack.
//!
//! - [`database`] - store traits and the factory that builds the configured backend
//! - [`memory`] - in-process store, seedable from a JSON snapshot
//! - [`postgresql`] - PostgreSQL store over a connection pool
//!
//! The engine only sees the traits in [`database::traits`], so both
//! backends are interchangeable:
//!
//! ```rust
//! use hubtrack::adapters::database::Stores;
//! use hubtrack::adapters::memory::MemoryStore;
//! use std::sync::Arc;
//!
//! let stores = Stores::from_backend(Arc::new(MemoryStore::new()));
//! assert_eq!(stores.backend.backend_name(), "memory");
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
