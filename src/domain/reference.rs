//! External reference data: cities, branches, carriers, hub rates
//!
//! These tables are maintained by the enclosing application and are read-only
//! to this crate.

use crate::domain::ids::{BranchId, CityId, HubRateId, TransportId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A city, addressable by id or by its short code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub code: String,
}

/// A branch office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
}

/// An onward transport company (carrier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    pub id: TransportId,

    pub name: String,

    /// City the carrier serves
    #[serde(default)]
    pub city_id: Option<CityId>,

    #[serde(default)]
    pub mobile: Option<String>,

    #[serde(default)]
    pub address: Option<String>,
}

/// How a hub rate prices a shipment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    PerKg,
    PerPkg,
}

impl PricingMode {
    /// Wire / column name
    pub fn as_str(self) -> &'static str {
        match self {
            PricingMode::PerKg => "per_kg",
            PricingMode::PerPkg => "per_pkg",
        }
    }
}

impl fmt::Display for PricingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PricingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "per_kg" => Ok(PricingMode::PerKg),
            "per_pkg" => Ok(PricingMode::PerPkg),
            other => Err(format!(
                "Invalid pricing_mode '{other}'. Must be one of: per_kg, per_pkg"
            )),
        }
    }
}

/// The four fixed charges carried by both hub rates and kaat records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AncillaryCharges {
    #[serde(default)]
    pub dd_chrg: Decimal,

    #[serde(default)]
    pub ewb_chrg: Decimal,

    #[serde(default)]
    pub labour_chrg: Decimal,

    #[serde(default)]
    pub other_chrg: Decimal,
}

impl AncillaryCharges {
    /// Sum of all four charges
    pub fn total(&self) -> Decimal {
        self.dd_chrg + self.ewb_chrg + self.labour_chrg + self.other_chrg
    }
}

/// Pricing rule for a (carrier, destination city, goods type) key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubRate {
    pub id: HubRateId,

    pub transport_id: TransportId,

    pub destination_city_id: CityId,

    /// Goods type the rule is restricted to; `None` applies to any goods
    #[serde(default)]
    pub goods_type: Option<String>,

    pub pricing_mode: PricingMode,

    #[serde(default)]
    pub rate_per_kg: Option<Decimal>,

    #[serde(default)]
    pub rate_per_pkg: Option<Decimal>,

    #[serde(default)]
    pub min_charge: Option<Decimal>,

    #[serde(flatten)]
    pub charges: AncillaryCharges,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl HubRate {
    /// Whether the rule applies to the (carrier, city) key
    pub fn matches(&self, transport_id: TransportId, city_id: CityId) -> bool {
        self.transport_id == transport_id && self.destination_city_id == city_id
    }

    /// Rate used by the rule's pricing mode
    pub fn unit_rate(&self) -> Option<Decimal> {
        match self.pricing_mode {
            PricingMode::PerKg => self.rate_per_kg,
            PricingMode::PerPkg => self.rate_per_pkg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pricing_mode_parse() {
        assert_eq!(PricingMode::from_str("PER_KG").unwrap(), PricingMode::PerKg);
        assert_eq!(PricingMode::from_str("per_pkg").unwrap(), PricingMode::PerPkg);
        assert!(PricingMode::from_str("per_km").is_err());
    }

    #[test]
    fn test_unit_rate_follows_mode() {
        let rate = HubRate {
            id: HubRateId(1),
            transport_id: TransportId(1),
            destination_city_id: CityId(1),
            goods_type: None,
            pricing_mode: PricingMode::PerPkg,
            rate_per_kg: Some(dec!(5)),
            rate_per_pkg: Some(dec!(30)),
            min_charge: None,
            charges: AncillaryCharges::default(),
            is_active: true,
            updated_at: None,
        };
        assert_eq!(rate.unit_rate(), Some(dec!(30)));
    }

    #[test]
    fn test_ancillary_total() {
        let charges = AncillaryCharges {
            dd_chrg: dec!(10),
            ewb_chrg: dec!(2.5),
            labour_chrg: dec!(7),
            other_chrg: dec!(0.5),
        };
        assert_eq!(charges.total(), dec!(20));
    }

    #[test]
    fn test_hub_rate_deserializes_flat_charges() {
        let json = r#"{
            "id": 3, "transport_id": 4, "destination_city_id": 5,
            "pricing_mode": "per_kg", "rate_per_kg": "5", "min_charge": "20",
            "dd_chrg": "15", "labour_chrg": "4"
        }"#;
        let rate: HubRate = serde_json::from_str(json).unwrap();
        assert!(rate.is_active);
        assert_eq!(rate.charges.dd_chrg, dec!(15));
        assert_eq!(rate.charges.ewb_chrg, Decimal::ZERO);
        assert!(rate.matches(TransportId(4), CityId(5)));
    }
}
