//! Bulk operation summaries

use crate::core::bulk::kind::BulkTransitionKind;
use crate::domain::RowFailure;
use chrono::{DateTime, Utc};

/// Result of an accepted bulk status transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkTransitionSummary {
    pub kind: BulkTransitionKind,

    /// Distinct ids in the selection
    pub requested: usize,

    /// Records whose flags changed
    pub updated: usize,

    /// Timestamp written by the store
    pub applied_at: DateTime<Utc>,
}

impl BulkTransitionSummary {
    /// Records that already had the target flag
    pub fn unchanged(&self) -> usize {
        self.requested.saturating_sub(self.updated)
    }
}

/// Result of a bulk hub-rate application
///
/// Rows are independent: a failed row does not undo the rows written before
/// it, and rows after it are still attempted.
#[derive(Debug, Clone, Default)]
pub struct RateApplicationSummary {
    /// Shipments in the selection
    pub selected: usize,

    /// Rows written with a new kaat
    pub applied: usize,

    /// Rows whose stored kaat already matched
    pub unchanged: usize,

    /// Excluded: no carrier assigned
    pub skipped_no_carrier: usize,

    /// Excluded: no rate configured for carrier and destination
    pub skipped_no_rate: usize,

    /// Rows the store rejected
    pub failed: usize,

    pub errors: Vec<RowFailure>,
}

impl RateApplicationSummary {
    /// Create an empty summary for a selection
    pub fn new(selected: usize) -> Self {
        Self {
            selected,
            ..Default::default()
        }
    }

    /// Record a failed row
    pub fn add_failure(&mut self, failure: RowFailure) {
        self.failed += 1;
        self.errors.push(failure);
    }

    /// Rows excluded by a precondition
    pub fn skipped(&self) -> usize {
        self.skipped_no_carrier + self.skipped_no_rate
    }

    /// True when no row failed
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }
}

/// Result of a carrier auto-assignment run
#[derive(Debug, Clone, Default)]
pub struct AssignmentSummary {
    /// Shipments considered
    pub considered: usize,

    /// Ledger rows written with a carrier
    pub assigned: usize,

    /// Of the assigned rows, those without a configured rate
    pub assigned_without_rate: usize,

    /// Left alone: carrier already assigned
    pub already_assigned: usize,

    /// Left alone: zero or several eligible carriers
    pub ambiguous: usize,

    pub failed: usize,

    pub errors: Vec<RowFailure>,
}

impl AssignmentSummary {
    /// Record a failed row
    pub fn add_failure(&mut self, failure: RowFailure) {
        self.failed += 1;
        self.errors.push(failure);
    }

    /// True when no row failed
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GrNumber;
    use std::str::FromStr;

    #[test]
    fn test_rate_summary_counts() {
        let mut summary = RateApplicationSummary::new(5);
        summary.applied = 2;
        summary.skipped_no_carrier = 1;
        summary.skipped_no_rate = 1;
        assert!(summary.is_successful());
        assert_eq!(summary.skipped(), 2);

        summary.add_failure(RowFailure::new(GrNumber::from_str("G9").unwrap(), "timeout"));
        assert!(!summary.is_successful());
        assert_eq!(summary.errors.len(), 1);
    }

    #[test]
    fn test_transition_unchanged() {
        let summary = BulkTransitionSummary {
            kind: BulkTransitionKind::Out,
            requested: 4,
            updated: 3,
            applied_at: Utc::now(),
        };
        assert_eq!(summary.unchanged(), 1);
    }
}
