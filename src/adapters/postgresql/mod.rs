//! PostgreSQL backend
//!
//! Pooled connections through `deadpool-postgres`. Stage writes, bulk
//! transitions and ledger upserts each run in one transaction.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
