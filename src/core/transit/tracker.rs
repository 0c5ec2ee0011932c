//! Transit tracker service
//!
//! Drives single-record transitions against a [`TransitStore`]. The local
//! record is only mutated after the store accepted the write, so a failed
//! write leaves both copies unchanged.

use crate::adapters::database::traits::TransitStore;
use crate::core::transit::guard::InFlightSet;
use crate::core::transit::history::{sort_timeline, StageEvent};
use crate::core::transit::machine::TransitionPlan;
use crate::domain::ids::TransitRecordId;
use crate::domain::transit::{DoorDeliveryInfo, Stage, TransitRecord};
use crate::domain::{Challan, HubError, Result, TransitionError};
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

/// A caller's request to move one record to one stage
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub stage: Stage,

    /// Acting user, recorded in the stage history
    pub actor: String,

    /// Whether the user confirmed the transition
    pub confirmed: bool,

    /// Only used for [`Stage::OutForDoorDelivery`]
    pub door_delivery: Option<DoorDeliveryInfo>,
}

impl TransitionRequest {
    /// A confirmed request
    pub fn confirmed(stage: Stage, actor: impl Into<String>) -> Self {
        Self {
            stage,
            actor: actor.into(),
            confirmed: true,
            door_delivery: None,
        }
    }

    /// A request the user has not confirmed yet
    pub fn unconfirmed(stage: Stage, actor: impl Into<String>) -> Self {
        Self {
            confirmed: false,
            ..Self::confirmed(stage, actor)
        }
    }

    /// Attaches door-delivery details
    pub fn with_door_delivery(mut self, info: DoorDeliveryInfo) -> Self {
        self.door_delivery = Some(info);
        self
    }
}

/// What a transition did
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// Flags were set; one event per flag
    Applied {
        at: DateTime<Utc>,
        events: Vec<StageEvent>,
    },

    /// Target flag was already set; nothing was written
    AlreadyApplied,
}

impl TransitionOutcome {
    /// Whether anything changed
    pub fn is_applied(&self) -> bool {
        matches!(self, TransitionOutcome::Applied { .. })
    }
}

/// Single-record transitions, remarks and challan receipt
pub struct TransitTracker {
    store: Arc<dyn TransitStore + Send + Sync>,
    in_flight: Arc<InFlightSet>,
}

impl TransitTracker {
    /// Create a tracker with its own in-flight set
    pub fn new(store: Arc<dyn TransitStore + Send + Sync>) -> Self {
        Self::with_in_flight(store, Arc::new(InFlightSet::new()))
    }

    /// Create a tracker sharing an in-flight set with other writers
    pub fn with_in_flight(
        store: Arc<dyn TransitStore + Send + Sync>,
        in_flight: Arc<InFlightSet>,
    ) -> Self {
        Self { store, in_flight }
    }

    /// The in-flight set guarding this tracker's writes
    pub fn in_flight(&self) -> &Arc<InFlightSet> {
        &self.in_flight
    }

    /// Move a record to a stage
    ///
    /// # Errors
    ///
    /// - `TransitionError::NotConfirmed` if the request is unconfirmed
    /// - `TransitionError::Busy` if the same (record, stage) write is in flight
    /// - `TransitionError::WriteFailed` if the store rejected the write
    ///
    /// A target that is already set returns `AlreadyApplied` before any of
    /// these checks and before any write.
    pub async fn transition(
        &self,
        record: &mut TransitRecord,
        request: TransitionRequest,
    ) -> Result<TransitionOutcome> {
        let stage = request.stage;

        let Some(plan) = TransitionPlan::for_target(&record.flags, stage) else {
            crate::log_transition!(record.id, stage, request.actor, "already_applied");
            return Ok(TransitionOutcome::AlreadyApplied);
        };

        if !request.confirmed {
            return Err(TransitionError::NotConfirmed(stage).into());
        }

        let _token = self
            .in_flight
            .try_acquire(record.id, stage)
            .ok_or(TransitionError::Busy {
                record_id: record.id,
                stage,
            })?;

        let write = plan
            .into_write(record.id, Utc::now().trunc_subsecs(6), request.actor)
            .with_door_delivery(request.door_delivery);

        let events = match self.store.apply_stage_write(&write).await {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(
                    record_id = %record.id,
                    gr_no = %record.gr_no,
                    stage = %stage,
                    error = %e,
                    "Stage write failed, record left unchanged"
                );
                return Err(TransitionError::WriteFailed {
                    record_id: record.id,
                    stage,
                    message: e.to_string(),
                }
                .into());
            }
        };

        if events.is_empty() {
            // Another writer set the flags first; adopt the stored timestamps
            if let Some(stored) = self.store.get_transit_record(record.id).await? {
                *record = stored;
            }
            crate::log_transition!(record.id, stage, write.actor, "already_applied");
            return Ok(TransitionOutcome::AlreadyApplied);
        }

        write.apply_to(record);
        crate::log_transition!(record.id, stage, write.actor, "applied");
        if !write.plan.backfilled().is_empty() {
            tracing::debug!(
                record_id = %record.id,
                backfilled = ?write.plan.backfilled(),
                "Backfilled earlier stages"
            );
        }

        Ok(TransitionOutcome::Applied {
            at: write.at,
            events,
        })
    }

    /// Load a record by id and move it to a stage
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown record, otherwise as [`Self::transition`].
    pub async fn transition_by_id(
        &self,
        id: TransitRecordId,
        request: TransitionRequest,
    ) -> Result<(TransitRecord, TransitionOutcome)> {
        let mut record = self
            .store
            .get_transit_record(id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("transit record {id}")))?;

        let outcome = self.transition(&mut record, request).await?;
        Ok((record, outcome))
    }

    /// Replace the remarks of a record; blank text clears them
    pub async fn update_remarks(
        &self,
        record: &mut TransitRecord,
        remarks: Option<String>,
    ) -> Result<()> {
        let remarks = remarks
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        self.store
            .update_remarks(record.id, remarks.as_deref())
            .await?;

        tracing::info!(record_id = %record.id, gr_no = %record.gr_no, "Remarks updated");
        record.remarks = remarks;
        Ok(())
    }

    /// Mark a challan received at the hub
    ///
    /// Returns `false` without writing if the challan was already received.
    pub async fn receive_challan(&self, challan: &mut Challan, actor: &str) -> Result<bool> {
        if challan.is_received_at_hub {
            tracing::debug!(challan_no = %challan.challan_no, "Challan already received");
            return Ok(false);
        }

        // Stores keep microseconds; compared against the returned row below
        let at = Utc::now().trunc_subsecs(6);
        let stored = self
            .store
            .mark_challan_received(&challan.challan_no, at)
            .await?;

        let newly_received = stored.received_at_hub_timing == Some(at);
        *challan = stored;

        tracing::info!(
            challan_no = %challan.challan_no,
            actor = %actor,
            newly_received,
            "Challan received at hub"
        );
        Ok(newly_received)
    }

    /// Stage history of a record, oldest first
    pub async fn history(&self, id: TransitRecordId) -> Result<Vec<StageEvent>> {
        let mut events = self.store.list_stage_events(id).await?;
        sort_timeline(&mut events);
        Ok(events)
    }
}
