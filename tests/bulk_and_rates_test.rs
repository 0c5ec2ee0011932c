//! Integration tests for bulk transitions, auto-assignment and rate application

mod common;

use common::{challan_no, gr, seeded};
use hubtrack::adapters::memory::BulkFault;
use hubtrack::core::bulk::BulkTransitionKind;
use hubtrack::domain::{
    AncillaryCharges, HubError, HubRateId, KaatPatch, LedgerField, Stage, TransitRecord,
    TransitRecordId, TransitionError, TransportId,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_auto_assign_then_apply_rates() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();

    let summary = engine.assigner.run(&board.shipments, "clerk").await.unwrap();
    assert_eq!(summary.considered, 3);
    assert_eq!(summary.assigned, 1);
    // G2 has two Lucknow carriers, G3 has no destination
    assert_eq!(summary.ambiguous, 2);
    assert!(summary.is_successful());

    let g1 = engine.ledger.get(&gr("G1")).await.unwrap().unwrap();
    assert_eq!(g1.transport_id, Some(TransportId(5)));
    assert_eq!(g1.charges.labour_chrg, dec!(10));
    assert!(g1.kaat.is_none());
    assert!(engine.ledger.get(&gr("G2")).await.unwrap().is_none());

    let rates = engine
        .bulk
        .apply_rates(&board.shipments, "clerk")
        .await
        .unwrap();
    assert_eq!(rates.selected, 3);
    assert_eq!(rates.applied, 1);
    assert_eq!(rates.skipped_no_carrier, 2);
    assert!(rates.is_successful());

    // max(5 x 2, 20)
    let g1 = engine.ledger.get(&gr("G1")).await.unwrap().unwrap();
    assert_eq!(g1.kaat, Some(dec!(20)));
}

#[tokio::test]
async fn test_auto_assign_leaves_existing_carrier() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g2 = board.shipment(&gr("G2")).unwrap();

    engine
        .ledger
        .assign_carrier(g2, TransportId(6), "clerk")
        .await
        .unwrap();
    let summary = engine.assigner.run(&board.shipments, "clerk").await.unwrap();

    assert_eq!(summary.already_assigned, 1);
    assert_eq!(summary.assigned, 1);
    let g2_row = engine.ledger.get(&gr("G2")).await.unwrap().unwrap();
    assert_eq!(g2_row.transport_id, Some(TransportId(6)));
}

#[tokio::test]
async fn test_per_package_rate_for_station_shipment() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g2 = board.shipment(&gr("G2")).unwrap();

    engine
        .ledger
        .assign_carrier(g2, TransportId(6), "clerk")
        .await
        .unwrap();
    let rates = engine
        .bulk
        .apply_rates(&board.shipments, "clerk")
        .await
        .unwrap();

    assert_eq!(rates.applied, 1);
    let row = engine.ledger.get(&gr("G2")).await.unwrap().unwrap();
    assert_eq!(row.kaat, Some(dec!(37.50)));
}

#[tokio::test]
async fn test_carrier_without_rate_is_skipped_on_pricing() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g2 = board.shipment(&gr("G2")).unwrap();

    let row = engine
        .ledger
        .assign_carrier(g2, TransportId(7), "clerk")
        .await
        .unwrap();
    assert!(row.hub_rate_id.is_none());

    let rates = engine
        .bulk
        .apply_rates(&board.shipments, "clerk")
        .await
        .unwrap();
    assert_eq!(rates.skipped_no_rate, 1);
    assert_eq!(rates.applied, 0);
}

#[tokio::test]
async fn test_bulk_delivered_mirrors_store_timestamp() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let ids = [TransitRecordId(1), TransitRecordId(2)];

    let mut records: Vec<TransitRecord> =
        board.shipments.iter().map(|s| s.transit.clone()).collect();
    let summary = engine
        .bulk
        .transition(records.iter_mut(), &ids, BulkTransitionKind::Delivered, "clerk")
        .await
        .unwrap();

    assert_eq!(summary.requested, 2);
    assert_eq!(summary.updated, 2);
    for record in records.iter().filter(|r| ids.contains(&r.id)) {
        for stage in Stage::CHAIN {
            assert_eq!(record.flags.get(stage).at, Some(summary.applied_at));
        }
    }
    let untouched = records.iter().find(|r| r.id == TransitRecordId(3)).unwrap();
    assert!(!untouched.flags.is_done(Stage::DeliveredAtDestination));

    let stored = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(2))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.flags.is_done(Stage::OutFromOrigin));
}

#[tokio::test]
async fn test_bulk_rejects_unknown_ids_atomically() {
    let (_store, engine) = seeded();
    let ids = [TransitRecordId(1), TransitRecordId(99)];
    let mut records: Vec<TransitRecord> = Vec::new();

    let err = engine
        .bulk
        .transition(records.iter_mut(), &ids, BulkTransitionKind::Out, "clerk")
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::BulkRejected(_)));

    let stored = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.flags.is_done(Stage::OutFromHub));
}

#[tokio::test]
async fn test_partial_bulk_does_not_mirror_locally() {
    let (store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let mut records: Vec<TransitRecord> = board.shipments.iter().map(|s| s.transit.clone()).collect();
    let before = records.clone();

    store.inject_bulk_fault(BulkFault::Partial);
    let ids = [TransitRecordId(1), TransitRecordId(2)];
    let err = engine
        .bulk
        .transition(records.iter_mut(), &ids, BulkTransitionKind::Branch, "clerk")
        .await
        .unwrap_err();

    assert!(matches!(err, HubError::BulkRejected(_)));
    assert_eq!(records, before);
}

#[tokio::test]
async fn test_bulk_selection_bounds() {
    let (_store, engine) = seeded();
    let mut records: Vec<TransitRecord> = Vec::new();

    let err = engine
        .bulk
        .transition(records.iter_mut(), &[], BulkTransitionKind::Out, "clerk")
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));

    let too_many: Vec<TransitRecordId> = (1..=501).map(TransitRecordId).collect();
    let err = engine
        .bulk
        .transition(records.iter_mut(), &too_many, BulkTransitionKind::Out, "clerk")
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::Validation(_)));
}

#[tokio::test]
async fn test_bulk_blocked_by_held_pair() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let mut records: Vec<TransitRecord> =
        board.shipments.iter().map(|s| s.transit.clone()).collect();

    let held = engine
        .tracker
        .in_flight()
        .try_acquire(TransitRecordId(2), Stage::OutFromHub)
        .unwrap();
    let ids = [TransitRecordId(1), TransitRecordId(2)];
    let err = engine
        .bulk
        .transition(records.iter_mut(), &ids, BulkTransitionKind::Out, "clerk")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HubError::Transition(TransitionError::Busy {
            record_id: TransitRecordId(2),
            ..
        })
    ));
    let stored = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.flags.is_done(Stage::OutFromHub));
    drop(held);
}

#[tokio::test]
async fn test_carrier_change_switches_rule_and_keeps_kaat() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g2 = board.shipment(&gr("G2")).unwrap();

    engine
        .ledger
        .assign_carrier(g2, TransportId(6), "clerk")
        .await
        .unwrap();
    engine
        .ledger
        .upsert(&gr("G2"), KaatPatch::new().kaat(dec!(37.50)), "clerk")
        .await
        .unwrap();

    // Gomti Roadlines has no Lucknow rule
    let row = engine
        .ledger
        .assign_carrier(g2, TransportId(7), "clerk")
        .await
        .unwrap();
    assert_eq!(row.transport_id, Some(TransportId(7)));
    assert!(row.hub_rate_id.is_none());
    assert_eq!(row.kaat, Some(dec!(37.50)));

    // back to Awadh Cargo
    let row = engine
        .ledger
        .assign_carrier(g2, TransportId(6), "clerk")
        .await
        .unwrap();
    assert_eq!(row.hub_rate_id, Some(HubRateId(10)));
    assert_eq!(row.kaat, Some(dec!(37.50)));
}

#[tokio::test]
async fn test_carrier_without_rule_clears_previous_charges() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g1 = board.shipment(&gr("G1")).unwrap();

    let row = engine
        .ledger
        .assign_carrier(g1, TransportId(5), "clerk")
        .await
        .unwrap();
    assert_eq!(row.hub_rate_id, Some(HubRateId(9)));
    assert_eq!(row.charges.labour_chrg, dec!(10));

    let row = engine
        .ledger
        .assign_carrier(g1, TransportId(7), "clerk")
        .await
        .unwrap();
    assert_eq!(row.transport_id, Some(TransportId(7)));
    assert!(row.hub_rate_id.is_none());
    assert_eq!(row.charges, AncillaryCharges::default());
}

#[tokio::test]
async fn test_ledger_write_blocked_while_field_in_flight() {
    let (_store, engine) = seeded();
    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    let g1 = board.shipment(&gr("G1")).unwrap();

    let held = engine
        .ledger
        .busy()
        .claim((gr("G1"), LedgerField::Carrier))
        .unwrap();
    let summary = engine.assigner.run(&board.shipments, "clerk").await.unwrap();
    assert_eq!(summary.assigned, 0);
    assert!(!summary.is_successful());
    assert!(engine.ledger.get(&gr("G1")).await.unwrap().is_none());

    drop(held);
    let row = engine
        .ledger
        .assign_carrier(g1, TransportId(5), "clerk")
        .await
        .unwrap();
    assert_eq!(row.transport_id, Some(TransportId(5)));
}
