//! Shipment reconciler
//!
//! Pure transform from transit records plus pre-fetched source rows to the
//! unified shipment view. The primary source wins; the secondary source is
//! only consulted when the primary has no row. A GR number in neither
//! degrades to a placeholder instead of failing the board.

use crate::domain::ids::{BranchId, CityId, GrNumber};
use crate::domain::shipment::{Bilty, ShipmentSource, SourceKind, StationBilty, UnifiedShipment};
use crate::domain::{City, TransitRecord};
use std::collections::HashMap;

/// Lookup tables for one reconciliation pass
pub struct Reconciler<'a> {
    bilties: HashMap<&'a GrNumber, &'a Bilty>,
    station_bilties: HashMap<&'a GrNumber, &'a StationBilty>,
    cities_by_id: HashMap<CityId, &'a City>,
    cities_by_code: HashMap<String, &'a City>,
    branch_names: &'a HashMap<BranchId, String>,
}

impl<'a> Reconciler<'a> {
    /// Index the pre-fetched rows
    ///
    /// When a source table holds duplicate rows for one GR number the first
    /// one is used.
    pub fn new(
        bilties: &'a [Bilty],
        station_bilties: &'a [StationBilty],
        cities: &'a [City],
        branch_names: &'a HashMap<BranchId, String>,
    ) -> Self {
        let mut bilty_index = HashMap::new();
        for bilty in bilties {
            bilty_index.entry(&bilty.gr_no).or_insert(bilty);
        }

        let mut station_index = HashMap::new();
        for station in station_bilties {
            station_index.entry(&station.gr_no).or_insert(station);
        }

        Self {
            bilties: bilty_index,
            station_bilties: station_index,
            cities_by_id: cities.iter().map(|c| (c.id, c)).collect(),
            cities_by_code: cities.iter().map(|c| (normalize_code(&c.code), c)).collect(),
            branch_names,
        }
    }

    /// Which source holds a GR number
    pub fn resolve_source(&self, gr_no: &GrNumber) -> ShipmentSource {
        if let Some(bilty) = self.bilties.get(gr_no) {
            ShipmentSource::Regular((*bilty).clone())
        } else if let Some(station) = self.station_bilties.get(gr_no) {
            ShipmentSource::StationSummary((*station).clone())
        } else {
            ShipmentSource::Unknown
        }
    }

    /// Unified view of one record
    pub fn unify(&self, record: &TransitRecord) -> UnifiedShipment {
        let mut view = match self.resolve_source(&record.gr_no) {
            ShipmentSource::Regular(bilty) => self.from_regular(record, bilty),
            ShipmentSource::StationSummary(station) => self.from_station(record, station),
            ShipmentSource::Unknown => {
                tracing::warn!(
                    gr_no = %record.gr_no,
                    challan_no = %record.challan_no,
                    "GR number missing from both shipment sources"
                );
                UnifiedShipment::placeholder(record.clone())
            }
        };

        view.from_branch_name = self.branch_name(record.from_branch_id);
        view.to_branch_name = self.branch_name(record.to_branch_id);
        view
    }

    /// Unified views of all records, in input order
    pub fn reconcile(&self, records: &[TransitRecord]) -> Vec<UnifiedShipment> {
        records.iter().map(|r| self.unify(r)).collect()
    }

    fn from_regular(&self, record: &TransitRecord, bilty: Bilty) -> UnifiedShipment {
        UnifiedShipment {
            transit: record.clone(),
            source: SourceKind::Regular,
            consignor: bilty.consignor_name,
            consignee: bilty.consignee_name,
            destination_city: bilty
                .to_city_id
                .and_then(|id| self.cities_by_id.get(&id))
                .map(|c| (*c).clone()),
            packages: bilty.no_of_pkg,
            weight: bilty.wt,
            amount: bilty.total,
            payment_mode: bilty.payment_mode,
            contents: bilty.contain,
            image_ref: bilty.bilty_image,
            from_branch_name: None,
            to_branch_name: None,
        }
    }

    fn from_station(&self, record: &TransitRecord, station: StationBilty) -> UnifiedShipment {
        let destination_city = station
            .station
            .as_deref()
            .and_then(|code| self.cities_by_code.get(&normalize_code(code)))
            .map(|c| (*c).clone());

        if destination_city.is_none() {
            tracing::debug!(
                gr_no = %record.gr_no,
                station = ?station.station,
                "Station code did not resolve to a city"
            );
        }

        UnifiedShipment {
            transit: record.clone(),
            source: SourceKind::StationSummary,
            consignor: station.consignor,
            consignee: station.consignee,
            destination_city,
            packages: station.no_of_packets,
            weight: station.weight,
            amount: station.amount,
            payment_mode: station.payment_status,
            contents: station.contents,
            image_ref: station.image_url,
            from_branch_name: None,
            to_branch_name: None,
        }
    }

    fn branch_name(&self, id: Option<BranchId>) -> Option<String> {
        id.and_then(|id| self.branch_names.get(&id)).cloned()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{ChallanNumber, TransitRecordId};
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn gr(s: &str) -> GrNumber {
        GrNumber::from_str(s).unwrap()
    }

    fn record(id: i64, g: &str) -> TransitRecord {
        let mut r = TransitRecord::new(
            TransitRecordId(id),
            ChallanNumber::from_str("C-100").unwrap(),
            gr(g),
        );
        r.from_branch_id = Some(BranchId(1));
        r.to_branch_id = Some(BranchId(2));
        r
    }

    fn cities() -> Vec<City> {
        vec![
            City {
                id: CityId(1),
                name: "Kanpur".into(),
                code: "KNP".into(),
            },
            City {
                id: CityId(2),
                name: "Lucknow".into(),
                code: "LKO".into(),
            },
        ]
    }

    fn bilty(g: &str) -> Bilty {
        Bilty {
            gr_no: gr(g),
            consignor_name: Some("Agarwal Traders".into()),
            consignee_name: Some("Singh & Sons".into()),
            to_city_id: Some(CityId(1)),
            no_of_pkg: Some(3),
            wt: Some(dec!(42.5)),
            total: Some(dec!(900)),
            payment_mode: Some("to-pay".into()),
            contain: Some("Cloth".into()),
            bilty_image: None,
        }
    }

    fn station(g: &str, code: &str) -> StationBilty {
        StationBilty {
            gr_no: gr(g),
            consignor: Some("Verma Stores".into()),
            consignee: Some("Gupta Mart".into()),
            station: Some(code.into()),
            no_of_packets: Some(7),
            weight: Some(dec!(12)),
            amount: Some(dec!(300)),
            payment_status: Some("paid".into()),
            contents: Some("Medicine".into()),
            image_url: Some("img/s1.jpg".into()),
        }
    }

    fn branches() -> HashMap<BranchId, String> {
        HashMap::from([(BranchId(1), "Delhi".to_string()), (BranchId(2), "Kanpur Hub".to_string())])
    }

    #[test]
    fn test_primary_source_maps_fields() {
        let bilties = vec![bilty("G1")];
        let cities = cities();
        let branches = branches();
        let reconciler = Reconciler::new(&bilties, &[], &cities, &branches);

        let view = reconciler.unify(&record(1, "G1"));
        assert_eq!(view.source, SourceKind::Regular);
        assert_eq!(view.packages, Some(3));
        assert_eq!(view.weight, Some(dec!(42.5)));
        assert_eq!(view.destination_city_id(), Some(CityId(1)));
        assert_eq!(view.from_branch_name.as_deref(), Some("Delhi"));
        assert_eq!(view.to_branch_name.as_deref(), Some("Kanpur Hub"));
    }

    #[test]
    fn test_secondary_source_resolves_city_by_code() {
        let stations = vec![station("G2", " lko ")];
        let cities = cities();
        let branches = branches();
        let reconciler = Reconciler::new(&[], &stations, &cities, &branches);

        let view = reconciler.unify(&record(2, "G2"));
        assert_eq!(view.source, SourceKind::StationSummary);
        assert_eq!(view.packages, Some(7));
        assert_eq!(view.weight, Some(dec!(12)));
        assert_eq!(view.consignee.as_deref(), Some("Gupta Mart"));
        assert_eq!(view.destination_city_id(), Some(CityId(2)));
    }

    #[test]
    fn test_primary_wins_when_both_present() {
        let bilties = vec![bilty("G1")];
        let stations = vec![station("G1", "LKO")];
        let cities = cities();
        let branches = branches();
        let reconciler = Reconciler::new(&bilties, &stations, &cities, &branches);

        let view = reconciler.unify(&record(1, "G1"));
        assert_eq!(view.source, SourceKind::Regular);
        assert_eq!(view.destination_city_id(), Some(CityId(1)));
    }

    #[test]
    fn test_missing_everywhere_is_placeholder_in_order() {
        let bilties = vec![bilty("G1")];
        let cities = cities();
        let branches = branches();
        let reconciler = Reconciler::new(&bilties, &[], &cities, &branches);

        let views = reconciler.reconcile(&[record(5, "G9"), record(1, "G1")]);
        assert_eq!(views.len(), 2);
        assert!(views[0].is_source_missing());
        assert_eq!(views[0].gr_no().as_str(), "G9");
        assert_eq!(views[0].from_branch_name.as_deref(), Some("Delhi"));
        assert_eq!(views[1].source, SourceKind::Regular);
    }

    #[test]
    fn test_unknown_station_code_leaves_destination_empty() {
        let stations = vec![station("G3", "XYZ")];
        let cities = cities();
        let branches = branches();
        let reconciler = Reconciler::new(&[], &stations, &cities, &branches);

        let view = reconciler.unify(&record(3, "G3"));
        assert_eq!(view.source, SourceKind::StationSummary);
        assert!(view.destination_city.is_none());
    }
}
