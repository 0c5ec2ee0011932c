//! Bulk operation processor
//!
//! Two operations over a caller-supplied selection:
//! - a status transition the store applies all-or-nothing, mirrored locally
//!   only after the store reports success
//! - a hub-rate application that is atomic per row only

use crate::adapters::database::traits::TransitStore;
use crate::core::bulk::kind::{BulkTransitionKind, BulkTransitionReport};
use crate::core::bulk::summary::{BulkTransitionSummary, RateApplicationSummary};
use crate::core::ledger::{KaatLedger, RateApplication};
use crate::core::transit::{InFlightSet, TransitionPlan};
use crate::domain::ids::{GrNumber, TransitRecordId};
use crate::domain::{HubError, Result, RowFailure, TransitRecord, TransitionError, UnifiedShipment};
use std::collections::HashSet;
use std::sync::Arc;

/// Applies transitions and rates to many shipments at once
pub struct BulkProcessor {
    transit: Arc<dyn TransitStore + Send + Sync>,
    ledger: Arc<KaatLedger>,
    in_flight: Arc<InFlightSet>,
    max_selection: usize,
}

impl BulkProcessor {
    /// Create a processor
    ///
    /// Share `in_flight` with the single-record tracker so bulk and single
    /// writes to the same (record, stage) pair exclude each other.
    pub fn new(
        transit: Arc<dyn TransitStore + Send + Sync>,
        ledger: Arc<KaatLedger>,
        in_flight: Arc<InFlightSet>,
        max_selection: usize,
    ) -> Self {
        Self {
            transit,
            ledger,
            in_flight,
            max_selection,
        }
    }

    /// Move every selected record to the kind's target stage
    ///
    /// `records` is the caller's local copy, typically the loaded board's
    /// transit records. Those whose id is selected are mirrored with the
    /// store's timestamp once the store reports success. Nothing local
    /// changes otherwise.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty or oversized selection
    /// - `TransitionError::Busy` if any selected record has the same write in flight
    /// - `BulkRejected` if the store rejected or only partially applied the batch
    pub async fn transition<'r, R>(
        &self,
        records: R,
        ids: &[TransitRecordId],
        kind: BulkTransitionKind,
        actor: &str,
    ) -> Result<BulkTransitionSummary>
    where
        R: IntoIterator<Item = &'r mut TransitRecord>,
    {
        let ids = dedupe(ids.iter().copied());
        self.check_selection(ids.len())?;

        let target = kind.target_stage();
        let _token = self
            .in_flight
            .try_acquire_all(&ids, target)
            .map_err(|record_id| TransitionError::Busy {
                record_id,
                stage: target,
            })?;

        tracing::info!(kind = %kind, count = ids.len(), actor = %actor, "Starting bulk transition");
        let report = self.transit.bulk_transition(&ids, kind, actor).await?;

        match report {
            BulkTransitionReport::Applied {
                updated,
                applied_at,
            } => {
                let selected: HashSet<TransitRecordId> = ids.iter().copied().collect();
                for record in records.into_iter().filter(|r| selected.contains(&r.id)) {
                    if let Some(plan) = TransitionPlan::for_target(&record.flags, target) {
                        plan.into_write(record.id, applied_at, actor).apply_to(record);
                    }
                }

                let summary = BulkTransitionSummary {
                    kind,
                    requested: ids.len(),
                    updated,
                    applied_at,
                };
                crate::log_bulk_summary!(
                    kind.as_str(),
                    summary.requested,
                    summary.updated,
                    summary.unchanged(),
                    0
                );
                Ok(summary)
            }
            BulkTransitionReport::Rejected { reason } => {
                tracing::warn!(kind = %kind, reason = %reason, "Bulk transition rejected");
                Err(HubError::BulkRejected(reason))
            }
            BulkTransitionReport::PartiallyApplied { updated, failed } => {
                tracing::error!(
                    kind = %kind,
                    updated,
                    failed,
                    "Store partially applied an all-or-nothing bulk transition"
                );
                Err(HubError::BulkRejected(format!(
                    "store partially applied the batch ({updated} updated, {failed} failed); \
                     local state left unchanged"
                )))
            }
        }
    }

    /// Compute and store kaat for every selected shipment that can be priced
    ///
    /// Shipments without a carrier or without a configured rate are counted
    /// and skipped. Store failures are counted per row and do not stop the
    /// batch.
    ///
    /// # Errors
    ///
    /// Returns an error only if the selection is invalid or the existing
    /// ledger rows cannot be read; no row is written in that case.
    pub async fn apply_rates(
        &self,
        shipments: &[UnifiedShipment],
        actor: &str,
    ) -> Result<RateApplicationSummary> {
        let mut seen = HashSet::new();
        let selection: Vec<&UnifiedShipment> = shipments
            .iter()
            .filter(|s| seen.insert(s.gr_no().clone()))
            .collect();
        self.check_selection(selection.len())?;

        let gr_nos: Vec<GrNumber> = selection.iter().map(|s| s.gr_no().clone()).collect();
        let existing = self.ledger.for_shipments(&gr_nos).await?;

        let mut summary = RateApplicationSummary::new(selection.len());
        for shipment in selection {
            let gr_no = shipment.gr_no();
            match self
                .ledger
                .apply_rate(shipment, existing.get(gr_no), actor)
                .await
            {
                Ok(RateApplication::Applied(_)) => summary.applied += 1,
                Ok(RateApplication::Unchanged(_)) => summary.unchanged += 1,
                Ok(RateApplication::NoCarrier) => summary.skipped_no_carrier += 1,
                Ok(RateApplication::NoRate { .. }) => summary.skipped_no_rate += 1,
                Err(e) => {
                    tracing::warn!(gr_no = %gr_no, error = %e, "Rate application failed for row");
                    summary.add_failure(RowFailure::new(gr_no.clone(), e.to_string()));
                }
            }
        }

        crate::log_bulk_summary!(
            "apply_rates",
            summary.selected,
            summary.applied,
            summary.skipped() + summary.unchanged,
            summary.failed
        );
        Ok(summary)
    }

    fn check_selection(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Err(HubError::Validation("selection is empty".to_string()));
        }
        if count > self.max_selection {
            return Err(HubError::Validation(format!(
                "selection of {count} exceeds bulk.max_selection ({})",
                self.max_selection
            )));
        }
        Ok(())
    }
}

fn dedupe<I>(ids: I) -> Vec<TransitRecordId>
where
    I: IntoIterator<Item = TransitRecordId>,
{
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence_order() {
        let ids = [3, 1, 3, 2, 1].map(TransitRecordId);
        assert_eq!(
            dedupe(ids),
            vec![TransitRecordId(3), TransitRecordId(1), TransitRecordId(2)]
        );
    }
}
