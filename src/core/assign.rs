//! Carrier auto-assignment
//!
//! A shipment is assigned automatically only when its destination city has
//! exactly one eligible carrier and its ledger row has no carrier yet.
//! Assignment copies the rule's charges but leaves the kaat amount alone.

use crate::core::bulk::AssignmentSummary;
use crate::core::ledger::KaatLedger;
use crate::domain::ids::{CityId, GrNumber, TransportId};
use crate::domain::{KaatRecord, Result, RowFailure, UnifiedShipment};
use std::collections::HashMap;
use std::sync::Arc;

/// One shipment picked for automatic assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAssignment {
    pub gr_no: GrNumber,
    pub city_id: CityId,
    pub carrier: TransportId,
}

/// Why a shipment was or was not picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible(TransportId),
    AlreadyAssigned,
    /// No destination, or zero or several carriers for it
    Ambiguous,
}

/// Eligibility of one shipment
pub fn eligibility(
    shipment: &UnifiedShipment,
    carriers_by_city: &HashMap<CityId, Vec<TransportId>>,
    existing: &HashMap<GrNumber, KaatRecord>,
) -> Eligibility {
    if existing
        .get(shipment.gr_no())
        .is_some_and(KaatRecord::has_carrier)
    {
        return Eligibility::AlreadyAssigned;
    }

    let carriers = shipment
        .destination_city_id()
        .and_then(|city| carriers_by_city.get(&city));
    match carriers.map(Vec::as_slice) {
        Some([only]) => Eligibility::Eligible(*only),
        _ => Eligibility::Ambiguous,
    }
}

/// Shipments that qualify for automatic assignment, in input order
pub fn select_assignments(
    shipments: &[UnifiedShipment],
    carriers_by_city: &HashMap<CityId, Vec<TransportId>>,
    existing: &HashMap<GrNumber, KaatRecord>,
) -> Vec<AutoAssignment> {
    shipments
        .iter()
        .filter_map(|s| match eligibility(s, carriers_by_city, existing) {
            Eligibility::Eligible(carrier) => Some(AutoAssignment {
                gr_no: s.gr_no().clone(),
                city_id: s.destination_city_id()?,
                carrier,
            }),
            _ => None,
        })
        .collect()
}

/// Runs the selection and upserts the picked shipments
pub struct AutoAssigner {
    ledger: Arc<KaatLedger>,
}

impl AutoAssigner {
    /// Create an assigner over a ledger
    pub fn new(ledger: Arc<KaatLedger>) -> Self {
        Self { ledger }
    }

    /// Assign every eligible shipment
    ///
    /// Per-row failures are counted and do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error if reference data or existing ledger rows cannot be read.
    pub async fn run(&self, shipments: &[UnifiedShipment], actor: &str) -> Result<AssignmentSummary> {
        let snapshot = self.ledger.resolver().cache().snapshot().await?;
        let carriers_by_city = snapshot.carriers_by_city();

        let gr_nos: Vec<GrNumber> = shipments.iter().map(|s| s.gr_no().clone()).collect();
        let existing = self.ledger.for_shipments(&gr_nos).await?;

        let mut summary = AssignmentSummary {
            considered: shipments.len(),
            ..Default::default()
        };

        for shipment in shipments {
            let carrier = match eligibility(shipment, &carriers_by_city, &existing) {
                Eligibility::Eligible(carrier) => carrier,
                Eligibility::AlreadyAssigned => {
                    summary.already_assigned += 1;
                    continue;
                }
                Eligibility::Ambiguous => {
                    summary.ambiguous += 1;
                    continue;
                }
            };

            match self.ledger.assign_carrier(shipment, carrier, actor).await {
                Ok(record) => {
                    summary.assigned += 1;
                    if record.hub_rate_id.is_none() {
                        summary.assigned_without_rate += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        gr_no = %shipment.gr_no(),
                        carrier_id = %carrier,
                        error = %e,
                        "Auto-assignment failed for row"
                    );
                    summary.add_failure(RowFailure::new(shipment.gr_no().clone(), e.to_string()));
                }
            }
        }

        crate::log_bulk_summary!(
            "auto_assign",
            summary.considered,
            summary.assigned,
            summary.already_assigned + summary.ambiguous,
            summary.failed
        );
        Ok(summary)
    }
}
