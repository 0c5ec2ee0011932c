//! Rate resolver
//!
//! Looks up the hub rate for a (carrier, destination city) pair and computes
//! the kaat charge from it.

pub mod cache;
pub mod charge;
pub mod resolver;

pub use cache::{ReferenceCache, ReferenceSnapshot};
pub use charge::{compute_amount, compute_charge, round_kaat};
pub use resolver::{resolve_for_goods_in, resolve_in, select_rate, RateResolver, RateTiebreak};
