//! Status state machine
//!
//! Each shipment moves through
//! `OutFromOrigin -> DeliveredAtHub -> OutFromHub -> DeliveredAtDestination`,
//! with `OutForDoorDelivery` as an independent side flag. Flags are
//! monotonic; only the terminal stage backfills.

pub mod guard;
pub mod history;
pub mod machine;
pub mod tracker;

pub use guard::{BusySet, BusyToken, InFlightSet, InFlightToken, LedgerBusySet};
pub use history::{sort_timeline, StageEvent};
pub use machine::{StageWrite, TransitionPlan};
pub use tracker::{TransitTracker, TransitionOutcome, TransitionRequest};
