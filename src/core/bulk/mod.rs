//! Bulk operation processor

pub mod kind;
pub mod processor;
pub mod summary;

pub use kind::{BulkTransitionKind, BulkTransitionReport};
pub use processor::BulkProcessor;
pub use summary::{AssignmentSummary, BulkTransitionSummary, RateApplicationSummary};
