//! Store abstraction traits
//!
//! This module defines the traits that store adapters must implement to back
//! the transit engine. The engine only ever talks to these traits, so the
//! PostgreSQL adapter and the in-memory store are interchangeable.

use crate::core::bulk::{BulkTransitionKind, BulkTransitionReport};
use crate::core::transit::{StageEvent, StageWrite};
use crate::domain::ids::{ChallanNumber, GrNumber, TransitRecordId};
use crate::domain::{
    Bilty, Branch, Challan, City, HubRate, KaatPatch, KaatRecord, Result, StationBilty,
    TransitRecord, Transport,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read-only reference tables maintained by the enclosing application
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// All cities
    async fn list_cities(&self) -> Result<Vec<City>>;

    /// All branches
    async fn list_branches(&self) -> Result<Vec<Branch>>;

    /// All carriers
    async fn list_transports(&self) -> Result<Vec<Transport>>;

    /// Hub rates filtered by the active flag
    ///
    /// Rows are returned in store order; the resolver applies its own
    /// tiebreak on top.
    async fn list_active_hub_rates(&self) -> Result<Vec<HubRate>>;
}

/// The two read-only shipment source tables
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Primary (regular bilty) rows for a set of GR numbers
    async fn find_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<Bilty>>;

    /// Secondary (station bilty summary) rows for a set of GR numbers
    async fn find_station_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<StationBilty>>;
}

/// Challans, transit records and their stage history
#[async_trait]
pub trait TransitStore: Send + Sync {
    /// Load a challan by its business key
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if no challan has that number.
    async fn get_challan(&self, challan_no: &ChallanNumber) -> Result<Option<Challan>>;

    /// Set the hub-receipt flag of a challan if it is not set yet
    ///
    /// The flag is one-way: an already received challan keeps its original
    /// timestamp. Returns the stored challan after the write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown challan number.
    async fn mark_challan_received(
        &self,
        challan_no: &ChallanNumber,
        at: DateTime<Utc>,
    ) -> Result<Challan>;

    /// Transit records of a challan, in load order
    async fn list_transit_records(&self, challan_no: &ChallanNumber) -> Result<Vec<TransitRecord>>;

    /// Load one transit record
    async fn get_transit_record(&self, id: TransitRecordId) -> Result<Option<TransitRecord>>;

    /// Apply one stage write atomically, together with its history events
    ///
    /// Flags already set in the store are never overwritten. Returns the
    /// events for the flags this write actually set.
    async fn apply_stage_write(&self, write: &StageWrite) -> Result<Vec<StageEvent>>;

    /// Replace the free-text remarks of a record
    async fn update_remarks(&self, id: TransitRecordId, remarks: Option<&str>) -> Result<()>;

    /// Apply one transition kind to every listed record as a single unit
    ///
    /// The store chooses the timestamp. Either every record is updated or
    /// none is; `PartiallyApplied` is a contract violation the caller must
    /// treat as failure.
    async fn bulk_transition(
        &self,
        ids: &[TransitRecordId],
        kind: BulkTransitionKind,
        actor: &str,
    ) -> Result<BulkTransitionReport>;

    /// Stage history of a record
    async fn list_stage_events(&self, id: TransitRecordId) -> Result<Vec<StageEvent>>;
}

/// The charge ledger, keyed uniquely by GR number
#[async_trait]
pub trait KaatStore: Send + Sync {
    /// Load the ledger row of one shipment
    async fn get_kaat(&self, gr_no: &GrNumber) -> Result<Option<KaatRecord>>;

    /// Ledger rows for a set of GR numbers
    async fn list_kaat(&self, gr_nos: &[GrNumber]) -> Result<Vec<KaatRecord>>;

    /// Insert or update the row for a GR number
    ///
    /// A first write sets the creation audit; later writes only touch the
    /// update audit. Never creates a second row for the same GR number.
    async fn upsert_kaat(
        &self,
        gr_no: &GrNumber,
        patch: &KaatPatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<KaatRecord>;
}

/// A complete backend implementing every store
#[async_trait]
pub trait HubStore: ReferenceStore + ShipmentStore + TransitStore + KaatStore {
    /// Test the backend connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and indexes if missing
    async fn ensure_schema(&self) -> Result<()>;

    /// Backend name for logs and CLI output
    fn backend_name(&self) -> &str;
}
