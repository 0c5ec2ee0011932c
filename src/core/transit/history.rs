//! Stage history events
//!
//! Flags only say whether and when a stage was reached. The history log adds
//! who set each flag and whether it was set explicitly or by backfill.

use crate::domain::ids::TransitRecordId;
use crate::domain::transit::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One flag set on one transit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEvent {
    pub record_id: TransitRecordId,

    pub stage: Stage,

    pub at: DateTime<Utc>,

    pub actor: String,

    /// Set implicitly by a terminal transition
    #[serde(default)]
    pub backfilled: bool,
}

/// Orders events for display: oldest first, chain order within one write
pub fn sort_timeline(events: &mut [StageEvent]) {
    events.sort_by(|a, b| a.at.cmp(&b.at).then(a.stage.cmp(&b.stage)));
}
