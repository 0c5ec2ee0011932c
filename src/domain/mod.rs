//! Domain models and types for hubtrack.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`GrNumber`], [`ChallanNumber`], [`CityId`],
//!   [`TransportId`], [`HubRateId`], [`TransitRecordId`], [`BranchId`])
//! - **Records** ([`Challan`], [`TransitRecord`], [`Bilty`], [`StationBilty`],
//!   [`HubRate`], [`KaatRecord`])
//! - **The unified shipment view** ([`UnifiedShipment`]) produced by the reconciler
//! - **Error types** ([`HubError`], [`StoreError`], [`TransitionError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Row keys are newtypes, so ids of different tables cannot be mixed:
//!
//! ```rust
//! use hubtrack::domain::{CityId, TransportId};
//!
//! let city = CityId(12);
//! let carrier = TransportId(12);
//!
//! // This won't compile - a city id is not a carrier id
//! // let wrong: TransportId = city;
//! # let _ = (city, carrier);
//! ```
//!
//! # Ledger Exclusivity
//!
//! A kaat record is identified by a pohonch number or a bilty number, never
//! both. [`DocumentRef`] encodes that choice, so an invalid combination cannot
//! be built in memory:
//!
//! ```rust
//! use hubtrack::domain::{DocumentRef, KaatPatch};
//!
//! let patch = KaatPatch::new().document(DocumentRef::Pohonch("P-881".to_string()));
//! assert!(!patch.is_empty());
//! ```

pub mod challan;
pub mod context;
pub mod errors;
pub mod ids;
pub mod kaat;
pub mod reference;
pub mod result;
pub mod shipment;
pub mod transit;

// Re-export commonly used types for convenience
pub use challan::Challan;
pub use errors::{HubError, RowFailure, StoreError, TransitionError};
pub use ids::{BranchId, ChallanNumber, CityId, GrNumber, HubRateId, TransitRecordId, TransportId};
pub use kaat::{DocumentRef, KaatPatch, KaatRecord, LedgerField};
pub use reference::{AncillaryCharges, Branch, City, HubRate, PricingMode, Transport};
pub use result::Result;
pub use shipment::{Bilty, ShipmentSource, SourceKind, StationBilty, UnifiedShipment};
pub use transit::{DisplayStatus, DoorDeliveryInfo, Stage, StageFlags, StageMark, TransitRecord};
