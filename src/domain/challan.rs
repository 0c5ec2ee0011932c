//! Challan (dispatch manifest) model

use crate::domain::ids::{BranchId, ChallanNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dispatch manifest grouping the shipments of one vehicle trip
///
/// Challans are created at dispatch time by the enclosing application. The
/// only mutation owned by this crate is the one-way hub-receipt flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challan {
    pub id: i64,

    pub challan_no: ChallanNumber,

    #[serde(default)]
    pub branch_id: Option<BranchId>,

    #[serde(default)]
    pub vehicle_no: Option<String>,

    #[serde(default)]
    pub driver_name: Option<String>,

    #[serde(default)]
    pub owner_name: Option<String>,

    #[serde(default)]
    pub is_dispatched: bool,

    #[serde(default)]
    pub dispatch_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_received_at_hub: bool,

    #[serde(default)]
    pub received_at_hub_timing: Option<DateTime<Utc>>,
}

impl Challan {
    /// Creates a dispatched-but-not-received challan
    pub fn new(id: i64, challan_no: ChallanNumber) -> Self {
        Self {
            id,
            challan_no,
            branch_id: None,
            vehicle_no: None,
            driver_name: None,
            owner_name: None,
            is_dispatched: false,
            dispatch_date: None,
            is_received_at_hub: false,
            received_at_hub_timing: None,
        }
    }

    /// Sets the hub-receipt flag. Returns `false` if it was already set.
    pub fn mark_received_at_hub(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_received_at_hub {
            return false;
        }
        self.is_received_at_hub = true;
        self.received_at_hub_timing = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mark_received_is_one_way() {
        let mut challan = Challan::new(1, ChallanNumber::from_str("C-100").unwrap());
        let first = Utc::now();

        assert!(challan.mark_received_at_hub(first));
        assert!(!challan.mark_received_at_hub(first + chrono::Duration::hours(1)));
        assert!(challan.is_received_at_hub);
        assert_eq!(challan.received_at_hub_timing, Some(first));
    }
}
