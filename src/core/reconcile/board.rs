//! Transit board loading
//!
//! Pre-fetches everything the board of one challan needs (transit records,
//! both source tables for its GR numbers, reference data and ledger rows)
//! and runs the reconciler over it.

use crate::adapters::database::traits::{KaatStore, ShipmentStore, TransitStore};
use crate::core::rates::ReferenceCache;
use crate::core::reconcile::reconciler::Reconciler;
use crate::domain::ids::{ChallanNumber, GrNumber, TransitRecordId};
use crate::domain::shipment::SourceKind;
use crate::domain::transit::DisplayStatus;
use crate::domain::{Challan, HubError, KaatRecord, Result, TransitRecord, UnifiedShipment};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Everything shown for one challan
#[derive(Debug, Clone)]
pub struct TransitBoard {
    pub challan: Challan,

    /// Unified shipments in load order
    pub shipments: Vec<UnifiedShipment>,

    /// Ledger rows of the board's shipments
    pub kaat: HashMap<GrNumber, KaatRecord>,
}

impl TransitBoard {
    /// Look up a shipment by GR number
    pub fn shipment(&self, gr_no: &GrNumber) -> Option<&UnifiedShipment> {
        self.shipments.iter().find(|s| s.gr_no() == gr_no)
    }

    /// Look up a shipment by transit record id
    pub fn shipment_by_record(&self, id: TransitRecordId) -> Option<&UnifiedShipment> {
        self.shipments.iter().find(|s| s.transit.id == id)
    }

    /// Transit record ids in load order
    pub fn record_ids(&self) -> Vec<TransitRecordId> {
        self.shipments.iter().map(|s| s.transit.id).collect()
    }

    /// Mutable transit records, for mirroring bulk writes
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut TransitRecord> {
        self.shipments.iter_mut().map(|s| &mut s.transit)
    }

    /// Counts per status, per source and for the ledger
    pub fn summary(&self) -> BoardSummary {
        let mut summary = BoardSummary {
            total: self.shipments.len(),
            ..Default::default()
        };

        for shipment in &self.shipments {
            *summary
                .by_status
                .entry(shipment.display_status())
                .or_default() += 1;
            *summary.by_source.entry(shipment.source).or_default() += 1;

            if shipment.is_source_missing() {
                summary.reconciliation_gaps += 1;
            }
            if !shipment.transit.flags.skipped_stages().is_empty() {
                summary.with_skipped_stages += 1;
            }
            if let Some(row) = self.kaat.get(shipment.gr_no()) {
                if row.has_carrier() {
                    summary.with_carrier += 1;
                }
                if row.kaat.is_some() {
                    summary.priced += 1;
                }
            }
        }

        summary
    }
}

/// Aggregate counts for a board
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSummary {
    pub total: usize,
    pub by_status: BTreeMap<DisplayStatus, usize>,
    pub by_source: BTreeMap<SourceKind, usize>,

    /// Placeholder rows: GR number in neither source
    pub reconciliation_gaps: usize,

    /// Rows with an unset chain stage before their furthest set one
    pub with_skipped_stages: usize,

    pub with_carrier: usize,
    pub priced: usize,
}

impl BoardSummary {
    /// Count for one status
    pub fn status_count(&self, status: DisplayStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Loads transit boards from the stores
pub struct BoardLoader {
    transit: Arc<dyn TransitStore + Send + Sync>,
    shipments: Arc<dyn ShipmentStore + Send + Sync>,
    kaat: Arc<dyn KaatStore + Send + Sync>,
    reference: Arc<ReferenceCache>,
}

impl BoardLoader {
    /// Create a loader
    pub fn new(
        transit: Arc<dyn TransitStore + Send + Sync>,
        shipments: Arc<dyn ShipmentStore + Send + Sync>,
        kaat: Arc<dyn KaatStore + Send + Sync>,
        reference: Arc<ReferenceCache>,
    ) -> Self {
        Self {
            transit,
            shipments,
            kaat,
            reference,
        }
    }

    /// Load and reconcile the board of one challan
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown challan, or a store error. Missing
    /// source rows are not errors; they become placeholders.
    pub async fn load(&self, challan_no: &ChallanNumber) -> Result<TransitBoard> {
        let (challan, records) = tokio::try_join!(
            self.transit.get_challan(challan_no),
            self.transit.list_transit_records(challan_no),
        )?;
        let challan = challan.ok_or_else(|| HubError::NotFound(format!("challan {challan_no}")))?;
        let gr_nos: Vec<GrNumber> = records.iter().map(|r| r.gr_no.clone()).collect();

        // Station rows are only looked up for GRs without a regular bilty
        let sources = async {
            let bilties = self.shipments.find_bilties(&gr_nos).await?;
            let found: HashSet<&GrNumber> = bilties.iter().map(|b| &b.gr_no).collect();
            let remaining: Vec<GrNumber> = gr_nos
                .iter()
                .filter(|g| !found.contains(g))
                .cloned()
                .collect();
            let station_bilties = if remaining.is_empty() {
                Vec::new()
            } else {
                self.shipments.find_station_bilties(&remaining).await?
            };
            Ok::<_, HubError>((bilties, station_bilties))
        };

        let ((bilties, station_bilties), snapshot, kaat_rows) = tokio::try_join!(
            sources,
            self.reference.snapshot(),
            self.kaat.list_kaat(&gr_nos),
        )?;

        let branch_names = snapshot.branch_names();
        let reconciler = Reconciler::new(&bilties, &station_bilties, &snapshot.cities, &branch_names);
        let shipments = reconciler.reconcile(&records);

        let kaat = kaat_rows.into_iter().map(|r| (r.gr_no.clone(), r)).collect();

        let board = TransitBoard {
            challan,
            shipments,
            kaat,
        };
        tracing::info!(
            challan_no = %challan_no,
            shipments = board.shipments.len(),
            gaps = board.shipments.iter().filter(|s| s.is_source_missing()).count(),
            "Transit board loaded"
        );
        Ok(board)
    }
}
