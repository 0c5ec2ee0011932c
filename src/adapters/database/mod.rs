//! Store abstraction layer
//!
//! This module provides a trait-based abstraction over persistence,
//! allowing hubtrack to run against PostgreSQL or an in-memory store.

pub mod factory;
pub mod traits;

pub use factory::{create_stores, Stores};
pub use traits::{HubStore, KaatStore, ReferenceStore, ShipmentStore, TransitStore};
