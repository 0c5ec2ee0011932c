//! Shipment reconciler and transit board

pub mod board;
pub mod reconciler;

pub use board::{BoardLoader, BoardSummary, TransitBoard};
pub use reconciler::Reconciler;
