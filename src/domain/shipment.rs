//! Shipment source records and the unified shipment view
//!
//! A shipment's descriptive data lives in exactly one of two tables with
//! different vocabularies: regular bilties and station bilty summaries. The
//! reconciler resolves which one applies and produces a [`UnifiedShipment`]
//! so nothing downstream needs to know which table a GR number came from.

use crate::domain::ids::{CityId, GrNumber};
use crate::domain::reference::City;
use crate::domain::transit::{DisplayStatus, TransitRecord};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Row of the primary (regular bilty) source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bilty {
    pub gr_no: GrNumber,

    #[serde(default)]
    pub consignor_name: Option<String>,

    #[serde(default)]
    pub consignee_name: Option<String>,

    /// Destination city by foreign key
    #[serde(default)]
    pub to_city_id: Option<CityId>,

    #[serde(default)]
    pub no_of_pkg: Option<i32>,

    #[serde(default)]
    pub wt: Option<Decimal>,

    #[serde(default)]
    pub total: Option<Decimal>,

    #[serde(default)]
    pub payment_mode: Option<String>,

    #[serde(default)]
    pub contain: Option<String>,

    #[serde(default)]
    pub bilty_image: Option<String>,
}

/// Row of the secondary (station bilty summary) source table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationBilty {
    pub gr_no: GrNumber,

    #[serde(default)]
    pub consignor: Option<String>,

    #[serde(default)]
    pub consignee: Option<String>,

    /// Destination city by city code
    #[serde(default)]
    pub station: Option<String>,

    #[serde(default)]
    pub no_of_packets: Option<i32>,

    #[serde(default)]
    pub weight: Option<Decimal>,

    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub payment_status: Option<String>,

    #[serde(default)]
    pub contents: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

/// The source a GR number was resolved against
#[derive(Debug, Clone, PartialEq)]
pub enum ShipmentSource {
    Regular(Bilty),
    StationSummary(StationBilty),
    /// GR number present in neither table
    Unknown,
}

impl ShipmentSource {
    /// Tag of the variant
    pub fn kind(&self) -> SourceKind {
        match self {
            ShipmentSource::Regular(_) => SourceKind::Regular,
            ShipmentSource::StationSummary(_) => SourceKind::StationSummary,
            ShipmentSource::Unknown => SourceKind::Unknown,
        }
    }
}

/// Which source table a unified shipment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Regular,
    StationSummary,
    Unknown,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Regular => "regular",
            SourceKind::StationSummary => "station_summary",
            SourceKind::Unknown => "unknown",
        })
    }
}

/// Schema-agnostic view of one shipment on a challan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedShipment {
    pub transit: TransitRecord,

    pub source: SourceKind,

    pub consignor: Option<String>,

    pub consignee: Option<String>,

    pub destination_city: Option<City>,

    pub packages: Option<i32>,

    pub weight: Option<Decimal>,

    pub amount: Option<Decimal>,

    pub payment_mode: Option<String>,

    pub contents: Option<String>,

    pub image_ref: Option<String>,

    pub from_branch_name: Option<String>,

    pub to_branch_name: Option<String>,
}

impl UnifiedShipment {
    /// Placeholder for a GR number missing from both sources
    pub fn placeholder(transit: TransitRecord) -> Self {
        Self {
            transit,
            source: SourceKind::Unknown,
            consignor: None,
            consignee: None,
            destination_city: None,
            packages: None,
            weight: None,
            amount: None,
            payment_mode: None,
            contents: None,
            image_ref: None,
            from_branch_name: None,
            to_branch_name: None,
        }
    }

    /// GR number of the shipment
    pub fn gr_no(&self) -> &GrNumber {
        &self.transit.gr_no
    }

    /// Resolved destination city id, if any
    pub fn destination_city_id(&self) -> Option<CityId> {
        self.destination_city.as_ref().map(|c| c.id)
    }

    /// True for reconciliation gaps
    pub fn is_source_missing(&self) -> bool {
        self.source == SourceKind::Unknown
    }

    /// Derived board status
    pub fn display_status(&self) -> DisplayStatus {
        self.transit.display_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{ChallanNumber, TransitRecordId};
    use std::str::FromStr;

    #[test]
    fn test_placeholder_is_empty() {
        let record = TransitRecord::new(
            TransitRecordId(1),
            ChallanNumber::from_str("C-1").unwrap(),
            GrNumber::from_str("G1").unwrap(),
        );
        let view = UnifiedShipment::placeholder(record);

        assert!(view.is_source_missing());
        assert_eq!(view.gr_no().as_str(), "G1");
        assert!(view.destination_city_id().is_none());
        assert!(view.weight.is_none());
        assert_eq!(view.display_status(), DisplayStatus::Pending);
    }

    #[test]
    fn test_source_kind() {
        assert_eq!(ShipmentSource::Unknown.kind(), SourceKind::Unknown);
        assert_eq!(SourceKind::StationSummary.to_string(), "station_summary");
    }
}
