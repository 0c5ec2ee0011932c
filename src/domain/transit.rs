//! Transit record model
//!
//! A transit record is one shipment loaded on one challan. Its delivery
//! progress is stored as independent flag/timestamp pairs so that partially
//! completed (skipped) stages stay representable.

use crate::domain::ids::{BranchId, ChallanNumber, GrNumber, TransitRecordId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A delivery stage that can be marked complete on a transit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Left the origin branch
    OutFromOrigin,
    /// Received at the hub branch
    DeliveredAtHub,
    /// Dispatched onward from the hub
    OutFromHub,
    /// Delivered at the destination (terminal stage of the main chain)
    DeliveredAtDestination,
    /// Sent out for final-mile door delivery; independent of the main chain
    OutForDoorDelivery,
}

impl Stage {
    /// The main delivery chain in strict forward order
    pub const CHAIN: [Stage; 4] = [
        Stage::OutFromOrigin,
        Stage::DeliveredAtHub,
        Stage::OutFromHub,
        Stage::DeliveredAtDestination,
    ];

    /// All stages, chain first
    pub const ALL: [Stage; 5] = [
        Stage::OutFromOrigin,
        Stage::DeliveredAtHub,
        Stage::OutFromHub,
        Stage::DeliveredAtDestination,
        Stage::OutForDoorDelivery,
    ];

    /// Position in the main chain, `None` for the door-delivery flag
    pub fn chain_position(self) -> Option<usize> {
        Self::CHAIN.iter().position(|s| *s == self)
    }

    /// Column / wire name of the stage
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::OutFromOrigin => "out_from_origin",
            Stage::DeliveredAtHub => "delivered_at_hub",
            Stage::OutFromHub => "out_from_hub",
            Stage::DeliveredAtDestination => "delivered_at_destination",
            Stage::OutForDoorDelivery => "out_for_door_delivery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid stage '{}'. Must be one of: {}",
                    s,
                    Stage::ALL
                        .iter()
                        .map(|st| st.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// One flag/timestamp pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMark {
    /// Whether the stage is complete
    pub done: bool,

    /// When the stage was marked complete
    pub at: Option<DateTime<Utc>>,
}

impl StageMark {
    /// A completed mark at the given time
    pub fn done_at(at: DateTime<Utc>) -> Self {
        Self {
            done: true,
            at: Some(at),
        }
    }
}

/// Derived, read-only status shown on the transit board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayStatus {
    Pending,
    InTransit,
    AtHub,
    OutFromHub,
    OutForDoorDelivery,
    Delivered,
}

impl DisplayStatus {
    /// Human label used by the board
    pub fn label(self) -> &'static str {
        match self {
            DisplayStatus::Pending => "Pending",
            DisplayStatus::InTransit => "In transit",
            DisplayStatus::AtHub => "At hub",
            DisplayStatus::OutFromHub => "Out from hub",
            DisplayStatus::OutForDoorDelivery => "Out for door delivery",
            DisplayStatus::Delivered => "Delivered",
        }
    }
}

impl fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five stage pairs of a transit record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFlags {
    pub out_from_origin: StageMark,
    pub delivered_at_hub: StageMark,
    pub out_from_hub: StageMark,
    pub delivered_at_destination: StageMark,
    pub out_for_door_delivery: StageMark,
}

impl StageFlags {
    /// Returns the pair for a stage
    pub fn get(&self, stage: Stage) -> &StageMark {
        match stage {
            Stage::OutFromOrigin => &self.out_from_origin,
            Stage::DeliveredAtHub => &self.delivered_at_hub,
            Stage::OutFromHub => &self.out_from_hub,
            Stage::DeliveredAtDestination => &self.delivered_at_destination,
            Stage::OutForDoorDelivery => &self.out_for_door_delivery,
        }
    }

    pub(crate) fn get_mut(&mut self, stage: Stage) -> &mut StageMark {
        match stage {
            Stage::OutFromOrigin => &mut self.out_from_origin,
            Stage::DeliveredAtHub => &mut self.delivered_at_hub,
            Stage::OutFromHub => &mut self.out_from_hub,
            Stage::DeliveredAtDestination => &mut self.delivered_at_destination,
            Stage::OutForDoorDelivery => &mut self.out_for_door_delivery,
        }
    }

    /// Whether the stage flag is set
    pub fn is_done(&self, stage: Stage) -> bool {
        self.get(stage).done
    }

    /// Marks a stage complete. Never clears a flag that is already set.
    pub(crate) fn mark(&mut self, stage: Stage, at: DateTime<Utc>) {
        let mark = self.get_mut(stage);
        if !mark.done {
            *mark = StageMark::done_at(at);
        }
    }

    /// Most advanced status, scanning from delivered down to pending
    pub fn display_status(&self) -> DisplayStatus {
        if self.delivered_at_destination.done {
            DisplayStatus::Delivered
        } else if self.out_for_door_delivery.done {
            DisplayStatus::OutForDoorDelivery
        } else if self.out_from_hub.done {
            DisplayStatus::OutFromHub
        } else if self.delivered_at_hub.done {
            DisplayStatus::AtHub
        } else if self.out_from_origin.done {
            DisplayStatus::InTransit
        } else {
            DisplayStatus::Pending
        }
    }

    /// Chain stages before the most advanced set one that are still unset
    pub fn skipped_stages(&self) -> Vec<Stage> {
        let furthest = Stage::CHAIN.iter().rposition(|s| self.is_done(*s));
        match furthest {
            Some(idx) => Stage::CHAIN[..idx]
                .iter()
                .copied()
                .filter(|s| !self.is_done(*s))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Vehicle and agent details recorded with an out-for-door-delivery mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorDeliveryInfo {
    #[serde(default)]
    pub vehicle_no: Option<String>,

    #[serde(default)]
    pub agent_name: Option<String>,

    #[serde(default)]
    pub agent_phone: Option<String>,
}

impl DoorDeliveryInfo {
    /// True when no detail was supplied
    pub fn is_empty(&self) -> bool {
        self.vehicle_no.is_none() && self.agent_name.is_none() && self.agent_phone.is_none()
    }
}

/// One shipment on one challan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitRecord {
    pub id: TransitRecordId,

    pub challan_no: ChallanNumber,

    pub gr_no: GrNumber,

    #[serde(default)]
    pub from_branch_id: Option<BranchId>,

    #[serde(default)]
    pub to_branch_id: Option<BranchId>,

    #[serde(default)]
    pub flags: StageFlags,

    #[serde(default)]
    pub remarks: Option<String>,

    #[serde(default)]
    pub door_delivery: Option<DoorDeliveryInfo>,
}

impl TransitRecord {
    /// Creates a pending record with no stage set
    pub fn new(id: TransitRecordId, challan_no: ChallanNumber, gr_no: GrNumber) -> Self {
        Self {
            id,
            challan_no,
            gr_no,
            from_branch_id: None,
            to_branch_id: None,
            flags: StageFlags::default(),
            remarks: None,
            door_delivery: None,
        }
    }

    /// Derived board status
    pub fn display_status(&self) -> DisplayStatus {
        self.flags.display_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("delivered_at_hub", Stage::DeliveredAtHub)]
    #[test_case("OUT-FROM-HUB", Stage::OutFromHub)]
    #[test_case(" out_for_door_delivery ", Stage::OutForDoorDelivery)]
    fn test_stage_parse(input: &str, expected: Stage) {
        assert_eq!(Stage::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_stage_parse_invalid() {
        let err = Stage::from_str("teleported").unwrap_err();
        assert!(err.contains("delivered_at_destination"));
    }

    #[test]
    fn test_chain_position() {
        assert_eq!(Stage::OutFromOrigin.chain_position(), Some(0));
        assert_eq!(Stage::DeliveredAtDestination.chain_position(), Some(3));
        assert_eq!(Stage::OutForDoorDelivery.chain_position(), None);
    }

    #[test]
    fn test_display_status_pending() {
        assert_eq!(StageFlags::default().display_status(), DisplayStatus::Pending);
    }

    #[test]
    fn test_display_status_picks_most_advanced() {
        let now = Utc::now();
        let mut flags = StageFlags::default();
        flags.mark(Stage::OutFromOrigin, now);
        assert_eq!(flags.display_status(), DisplayStatus::InTransit);

        flags.mark(Stage::OutFromHub, now);
        assert_eq!(flags.display_status(), DisplayStatus::OutFromHub);

        flags.mark(Stage::OutForDoorDelivery, now);
        assert_eq!(flags.display_status(), DisplayStatus::OutForDoorDelivery);

        flags.mark(Stage::DeliveredAtDestination, now);
        assert_eq!(flags.display_status(), DisplayStatus::Delivered);
    }

    #[test]
    fn test_mark_never_overwrites() {
        let first = Utc::now();
        let later = first + chrono::Duration::minutes(5);
        let mut flags = StageFlags::default();
        flags.mark(Stage::DeliveredAtHub, first);
        flags.mark(Stage::DeliveredAtHub, later);
        assert_eq!(flags.delivered_at_hub.at, Some(first));
    }

    #[test]
    fn test_skipped_stages() {
        let mut flags = StageFlags::default();
        flags.mark(Stage::OutFromHub, Utc::now());
        assert_eq!(
            flags.skipped_stages(),
            vec![Stage::OutFromOrigin, Stage::DeliveredAtHub]
        );
    }
}
