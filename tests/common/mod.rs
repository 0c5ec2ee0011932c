//! Shared fixtures for integration tests

#![allow(dead_code)]

use hubtrack::adapters::database::Stores;
use hubtrack::adapters::memory::{MemorySeed, MemoryStore};
use hubtrack::core::engine::{EngineSettings, HubEngine};
use hubtrack::domain::{
    AncillaryCharges, Bilty, Challan, ChallanNumber, City, CityId, GrNumber, HubRate, HubRateId,
    PricingMode, StationBilty, TransitRecord, TransitRecordId, Transport, TransportId,
};
use rust_decimal_macros::dec;
use std::str::FromStr;
use std::sync::Arc;

pub fn gr(s: &str) -> GrNumber {
    GrNumber::from_str(s).unwrap()
}

pub fn challan_no(s: &str) -> ChallanNumber {
    ChallanNumber::from_str(s).unwrap()
}

pub fn record(id: i64, challan: &str, gr_no: &str) -> TransitRecord {
    TransitRecord::new(TransitRecordId(id), challan_no(challan), gr(gr_no))
}

/// Challan C-100 with:
/// - G1: regular bilty to Kanpur, 2 kg
/// - G2: station bilty to Lucknow (code "LKO"), 3 packets
/// - G3: in neither source
///
/// X-Transport serves Kanpur at 5/kg with a minimum of 20. Lucknow has two
/// carriers, so it never qualifies for auto-assignment.
pub fn seed() -> MemorySeed {
    MemorySeed {
        cities: vec![
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
        ],
        transports: vec![
            Transport {
                id: TransportId(5),
                name: "X-Transport".into(),
                city_id: Some(CityId(1)),
                mobile: None,
                address: None,
            },
            Transport {
                id: TransportId(6),
                name: "Awadh Cargo".into(),
                city_id: Some(CityId(2)),
                mobile: None,
                address: None,
            },
            Transport {
                id: TransportId(7),
                name: "Gomti Roadlines".into(),
                city_id: Some(CityId(2)),
                mobile: None,
                address: None,
            },
        ],
        hub_rates: vec![
            HubRate {
                id: HubRateId(9),
                transport_id: TransportId(5),
                destination_city_id: CityId(1),
                goods_type: None,
                pricing_mode: PricingMode::PerKg,
                rate_per_kg: Some(dec!(5)),
                rate_per_pkg: None,
                min_charge: Some(dec!(20)),
                charges: AncillaryCharges {
                    labour_chrg: dec!(10),
                    ..Default::default()
                },
                is_active: true,
                updated_at: None,
            },
            HubRate {
                id: HubRateId(10),
                transport_id: TransportId(6),
                destination_city_id: CityId(2),
                goods_type: None,
                pricing_mode: PricingMode::PerPkg,
                rate_per_kg: None,
                rate_per_pkg: Some(dec!(12.5)),
                min_charge: None,
                charges: AncillaryCharges::default(),
                is_active: true,
                updated_at: None,
            },
        ],
        bilties: vec![Bilty {
            gr_no: gr("G1"),
            consignor_name: Some("Sharma Traders".into()),
            consignee_name: Some("Gupta Stores".into()),
            to_city_id: Some(CityId(1)),
            no_of_pkg: Some(1),
            wt: Some(dec!(2)),
            total: Some(dec!(350)),
            payment_mode: Some("paid".into()),
            contain: Some("Cloth".into()),
            bilty_image: None,
        }],
        station_bilties: vec![StationBilty {
            gr_no: gr("G2"),
            consignor: Some("Verma & Sons".into()),
            consignee: Some("Lucknow Mart".into()),
            station: Some("lko".into()),
            no_of_packets: Some(3),
            weight: Some(dec!(40)),
            amount: Some(dec!(900)),
            payment_status: Some("to_pay".into()),
            contents: Some("Utensils".into()),
            image_url: None,
        }],
        challans: vec![Challan::new(1, challan_no("C-100"))],
        transit_records: vec![
            record(1, "C-100", "G1"),
            record(2, "C-100", "G2"),
            record(3, "C-100", "G3"),
        ],
        ..Default::default()
    }
}

pub fn engine_over(store: Arc<MemoryStore>) -> HubEngine {
    HubEngine::new(Stores::from_backend(store), EngineSettings::default())
}

pub fn seeded() -> (Arc<MemoryStore>, HubEngine) {
    let store = Arc::new(MemoryStore::from_seed(seed()));
    let engine = engine_over(store.clone());
    (store, engine)
}
