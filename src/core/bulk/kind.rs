//! Bulk transition kinds and store reports

use crate::domain::transit::Stage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transition-type tag of a bulk status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkTransitionKind {
    /// Received at the hub branch
    Branch,
    /// Dispatched onward from the hub
    Out,
    /// Delivered at the destination, with backfill
    Delivered,
}

impl BulkTransitionKind {
    /// Stage every record in the selection is moved to
    pub fn target_stage(self) -> Stage {
        match self {
            BulkTransitionKind::Branch => Stage::DeliveredAtHub,
            BulkTransitionKind::Out => Stage::OutFromHub,
            BulkTransitionKind::Delivered => Stage::DeliveredAtDestination,
        }
    }

    /// Wire name of the tag
    pub fn as_str(self) -> &'static str {
        match self {
            BulkTransitionKind::Branch => "branch",
            BulkTransitionKind::Out => "out",
            BulkTransitionKind::Delivered => "delivered",
        }
    }
}

impl fmt::Display for BulkTransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkTransitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "branch" => Ok(BulkTransitionKind::Branch),
            "out" => Ok(BulkTransitionKind::Out),
            "delivered" => Ok(BulkTransitionKind::Delivered),
            other => Err(format!(
                "Invalid bulk transition '{other}'. Must be one of: branch, out, delivered"
            )),
        }
    }
}

/// Result of a bulk transition as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTransitionReport {
    /// Every record was processed
    Applied {
        /// Records whose flags changed; already-set records count as no-ops
        updated: usize,
        /// Timestamp the store wrote
        applied_at: DateTime<Utc>,
    },

    /// Nothing was written
    Rejected { reason: String },

    /// Some rows were written and some were not
    PartiallyApplied { updated: usize, failed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("branch", Stage::DeliveredAtHub)]
    #[test_case("OUT", Stage::OutFromHub)]
    #[test_case(" delivered ", Stage::DeliveredAtDestination)]
    fn test_kind_targets(input: &str, stage: Stage) {
        let kind = BulkTransitionKind::from_str(input).unwrap();
        assert_eq!(kind.target_stage(), stage);
    }

    #[test]
    fn test_kind_rejects_unknown() {
        assert!(BulkTransitionKind::from_str("door").is_err());
    }
}
