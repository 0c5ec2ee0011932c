//! Stage transition planning
//!
//! Planning is pure: it reads the current flags and decides which flags a
//! transition would set. Nothing is mutated until a store has accepted the
//! resulting [`StageWrite`].
//!
//! Rules:
//! - a transition to a flag that is already set plans nothing (no-op)
//! - only [`Stage::DeliveredAtDestination`] backfills, and it sets every
//!   earlier unset chain flag with the same timestamp
//! - every other stage sets only its own flag; gaps stay visible as skipped

use crate::core::transit::history::StageEvent;
use crate::domain::ids::TransitRecordId;
use crate::domain::transit::{DoorDeliveryInfo, Stage, StageFlags, TransitRecord};
use chrono::{DateTime, Utc};

/// Flags a single transition would set, in chain order with the target last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Stage the caller asked for
    pub target: Stage,

    /// Every flag the write sets, target included
    pub stages: Vec<Stage>,
}

impl TransitionPlan {
    /// Plans a transition, returning `None` when the target is already set
    pub fn for_target(flags: &StageFlags, target: Stage) -> Option<Self> {
        if flags.is_done(target) {
            return None;
        }

        let mut stages = Vec::new();
        if target == Stage::DeliveredAtDestination {
            stages.extend(
                Stage::CHAIN
                    .iter()
                    .copied()
                    .filter(|s| *s != target && !flags.is_done(*s)),
            );
        }
        stages.push(target);

        Some(Self { target, stages })
    }

    /// Stages set implicitly on top of the target
    pub fn backfilled(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .copied()
            .filter(|s| *s != self.target)
            .collect()
    }

    /// Binds the plan to a record, a timestamp and an actor
    pub fn into_write(
        self,
        record_id: TransitRecordId,
        at: DateTime<Utc>,
        actor: impl Into<String>,
    ) -> StageWrite {
        StageWrite {
            record_id,
            plan: self,
            at,
            actor: actor.into(),
            door_delivery: None,
        }
    }
}

/// One atomic flag write for one transit record
#[derive(Debug, Clone, PartialEq)]
pub struct StageWrite {
    pub record_id: TransitRecordId,

    pub plan: TransitionPlan,

    /// Timestamp shared by every flag the write sets
    pub at: DateTime<Utc>,

    pub actor: String,

    /// Stored only when the target is [`Stage::OutForDoorDelivery`]
    pub door_delivery: Option<DoorDeliveryInfo>,
}

impl StageWrite {
    /// Attaches door-delivery details
    pub fn with_door_delivery(mut self, info: Option<DoorDeliveryInfo>) -> Self {
        self.door_delivery = info.filter(|i| !i.is_empty());
        self
    }

    /// Applies the write to a record and returns one event per flag it set
    ///
    /// Flags already set on the record are left with their original
    /// timestamp and produce no event, so applying the same write twice
    /// changes nothing the second time.
    pub fn apply_to(&self, record: &mut TransitRecord) -> Vec<StageEvent> {
        let mut events = Vec::new();

        for stage in &self.plan.stages {
            if record.flags.is_done(*stage) {
                continue;
            }
            record.flags.mark(*stage, self.at);
            events.push(StageEvent {
                record_id: record.id,
                stage: *stage,
                at: self.at,
                actor: self.actor.clone(),
                backfilled: *stage != self.plan.target,
            });
        }

        let target_set = events.iter().any(|e| e.stage == Stage::OutForDoorDelivery);
        if target_set {
            if let Some(info) = &self.door_delivery {
                record.door_delivery = Some(info.clone());
            }
        }

        events
    }
}
