//! Integration tests for board reconciliation and single-record transitions

mod common;

use common::{challan_no, gr, seeded};
use hubtrack::core::transit::{TransitionOutcome, TransitionRequest};
use hubtrack::domain::{
    DisplayStatus, DoorDeliveryInfo, HubError, SourceKind, Stage, TransitRecordId, TransitionError,
};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_board_reconciles_both_sources_and_gaps() {
    let (_store, engine) = seeded();

    let board = engine.boards.load(&challan_no("C-100")).await.unwrap();
    assert_eq!(board.shipments.len(), 3);

    let g1 = board.shipment(&gr("G1")).unwrap();
    assert_eq!(g1.source, SourceKind::Regular);
    assert_eq!(g1.destination_city.as_ref().unwrap().name, "Kanpur");
    assert_eq!(g1.weight, Some(dec!(2)));

    let g2 = board.shipment(&gr("G2")).unwrap();
    assert_eq!(g2.source, SourceKind::StationSummary);
    assert_eq!(g2.destination_city.as_ref().unwrap().name, "Lucknow");
    assert_eq!(g2.packages, Some(3));

    let g3 = board.shipment(&gr("G3")).unwrap();
    assert_eq!(g3.source, SourceKind::Unknown);
    assert!(g3.is_source_missing());

    let summary = board.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.reconciliation_gaps, 1);
    assert_eq!(summary.status_count(DisplayStatus::Pending), 3);
}

#[tokio::test]
async fn test_unknown_challan_is_not_found() {
    let (_store, engine) = seeded();
    let err = engine.boards.load(&challan_no("C-404")).await.unwrap_err();
    assert!(matches!(err, HubError::NotFound(_)));
}

#[tokio::test]
async fn test_skipped_stage_stays_visible() {
    let (_store, engine) = seeded();

    let (record, outcome) = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::OutFromHub, "clerk"),
        )
        .await
        .unwrap();

    assert!(outcome.is_applied());
    assert_eq!(record.display_status(), DisplayStatus::OutFromHub);
    assert_eq!(
        record.flags.skipped_stages(),
        vec![Stage::OutFromOrigin, Stage::DeliveredAtHub]
    );
}

#[tokio::test]
async fn test_delivered_backfills_with_one_timestamp() {
    let (_store, engine) = seeded();

    engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::DeliveredAtHub, "clerk"),
        )
        .await
        .unwrap();

    let (record, outcome) = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::DeliveredAtDestination, "clerk"),
        )
        .await
        .unwrap();

    let TransitionOutcome::Applied { at, events } = outcome else {
        panic!("expected Applied");
    };
    let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::OutFromOrigin,
            Stage::OutFromHub,
            Stage::DeliveredAtDestination
        ]
    );
    for stage in Stage::CHAIN {
        assert!(record.flags.is_done(stage));
    }
    assert_eq!(record.flags.out_from_hub.at, Some(at));
    assert!(record.flags.skipped_stages().is_empty());
    assert!(!record.flags.is_done(Stage::OutForDoorDelivery));

    let history = engine.tracker.history(TransitRecordId(1)).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history.iter().filter(|e| e.backfilled).count(), 2);
}

#[tokio::test]
async fn test_repeat_transition_is_a_no_op() {
    let (_store, engine) = seeded();
    let request = || TransitionRequest::confirmed(Stage::DeliveredAtHub, "clerk");

    let (first, _) = engine
        .tracker
        .transition_by_id(TransitRecordId(2), request())
        .await
        .unwrap();
    let (second, outcome) = engine
        .tracker
        .transition_by_id(TransitRecordId(2), request())
        .await
        .unwrap();

    assert_eq!(outcome, TransitionOutcome::AlreadyApplied);
    assert_eq!(first.flags, second.flags);
    assert_eq!(engine.tracker.history(TransitRecordId(2)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unconfirmed_transition_writes_nothing() {
    let (_store, engine) = seeded();

    let err = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::unconfirmed(Stage::OutFromOrigin, "clerk"),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HubError::Transition(TransitionError::NotConfirmed(Stage::OutFromOrigin))
    ));
    let record = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!record.flags.is_done(Stage::OutFromOrigin));
}

#[tokio::test]
async fn test_failed_write_leaves_record_untouched() {
    let (store, engine) = seeded();
    let mut record = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(1))
        .await
        .unwrap()
        .unwrap();
    let before = record.clone();

    store.fail_writes(true);
    let result = engine
        .tracker
        .transition(
            &mut record,
            TransitionRequest::confirmed(Stage::DeliveredAtHub, "clerk"),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(record, before);
    assert!(engine.tracker.in_flight().is_empty());
}

#[tokio::test]
async fn test_door_delivery_is_independent_of_chain() {
    let (_store, engine) = seeded();

    let request = TransitionRequest::confirmed(Stage::OutForDoorDelivery, "clerk")
        .with_door_delivery(DoorDeliveryInfo {
            vehicle_no: Some("UP78 AB 1234".into()),
            agent_name: Some("Ramesh".into()),
            agent_phone: None,
        });
    let (record, _) = engine
        .tracker
        .transition_by_id(TransitRecordId(1), request)
        .await
        .unwrap();

    assert_eq!(record.display_status(), DisplayStatus::OutForDoorDelivery);
    assert!(record.flags.skipped_stages().is_empty());
    assert_eq!(
        record.door_delivery.and_then(|d| d.vehicle_no).as_deref(),
        Some("UP78 AB 1234")
    );
}

#[tokio::test]
async fn test_receive_challan_once() {
    let (_store, engine) = seeded();
    let mut challan = engine
        .stores
        .transit
        .get_challan(&challan_no("C-100"))
        .await
        .unwrap()
        .unwrap();

    assert!(engine.tracker.receive_challan(&mut challan, "clerk").await.unwrap());
    let first_at = challan.received_at_hub_timing;
    assert!(first_at.is_some());

    let mut stale = challan.clone();
    stale.is_received_at_hub = false;
    assert!(!engine.tracker.receive_challan(&mut stale, "clerk").await.unwrap());
    assert_eq!(stale.received_at_hub_timing, first_at);
}

#[tokio::test]
async fn test_remarks_blank_clears() {
    let (_store, engine) = seeded();
    let mut record = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(3))
        .await
        .unwrap()
        .unwrap();

    engine
        .tracker
        .update_remarks(&mut record, Some(" short by one carton ".into()))
        .await
        .unwrap();
    assert_eq!(record.remarks.as_deref(), Some("short by one carton"));

    engine
        .tracker
        .update_remarks(&mut record, Some("   ".into()))
        .await
        .unwrap();
    assert!(record.remarks.is_none());
}

#[tokio::test]
async fn test_held_pair_blocks_only_that_stage() {
    let (_store, engine) = seeded();
    let held = engine
        .tracker
        .in_flight()
        .try_acquire(TransitRecordId(1), Stage::DeliveredAtHub)
        .unwrap();

    let err = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::DeliveredAtHub, "clerk"),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HubError::Transition(TransitionError::Busy {
            record_id: TransitRecordId(1),
            stage: Stage::DeliveredAtHub,
        })
    ));
    let stored = engine
        .stores
        .transit
        .get_transit_record(TransitRecordId(1))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.flags.is_done(Stage::DeliveredAtHub));
    assert!(engine.tracker.history(TransitRecordId(1)).await.unwrap().is_empty());

    let (record, outcome) = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::OutFromOrigin, "clerk"),
        )
        .await
        .unwrap();
    assert!(outcome.is_applied());
    assert!(record.flags.is_done(Stage::OutFromOrigin));

    drop(held);
    let (_, outcome) = engine
        .tracker
        .transition_by_id(
            TransitRecordId(1),
            TransitionRequest::confirmed(Stage::DeliveredAtHub, "clerk"),
        )
        .await
        .unwrap();
    assert!(outcome.is_applied());
}
