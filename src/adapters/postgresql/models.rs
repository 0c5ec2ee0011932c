//! Row mapping between PostgreSQL tables and domain records

use crate::core::transit::StageEvent;
use crate::domain::ids::{
    BranchId, ChallanNumber, CityId, GrNumber, HubRateId, TransitRecordId, TransportId,
};
use crate::domain::{
    AncillaryCharges, Bilty, Branch, Challan, City, DocumentRef, DoorDeliveryInfo, HubError,
    HubRate, KaatRecord, Result, Stage, StageFlags, StageMark, StationBilty, StoreError,
    TransitRecord, Transport,
};
use rust_decimal::Decimal;
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;

/// Column list shared by every transit record query
pub const TRANSIT_COLUMNS: &str = "id, challan_no, gr_no, from_branch_id, to_branch_id, \
    is_out_from_origin, out_from_origin_at, is_delivered_at_hub, delivered_at_hub_at, \
    is_out_from_hub, out_from_hub_at, is_delivered_at_destination, delivered_at_destination_at, \
    is_out_for_door_delivery, out_for_door_delivery_at, remarks, \
    door_vehicle_no, door_agent_name, door_agent_phone";

/// Column list shared by every kaat query
pub const KAAT_COLUMNS: &str = "gr_no, pohonch_no, bilty_number, transport_id, hub_rate_id, \
    kaat, dd_chrg, ewb_chrg, labour_chrg, other_chrg, \
    created_by, created_at, updated_by, updated_at";

/// Flag and timestamp column names of a stage
pub fn stage_columns(stage: Stage) -> (&'static str, &'static str) {
    match stage {
        Stage::OutFromOrigin => ("is_out_from_origin", "out_from_origin_at"),
        Stage::DeliveredAtHub => ("is_delivered_at_hub", "delivered_at_hub_at"),
        Stage::OutFromHub => ("is_out_from_hub", "out_from_hub_at"),
        Stage::DeliveredAtDestination => {
            ("is_delivered_at_destination", "delivered_at_destination_at")
        }
        Stage::OutForDoorDelivery => ("is_out_for_door_delivery", "out_for_door_delivery_at"),
    }
}

fn col<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name).map_err(|e| {
        HubError::Store(StoreError::CorruptRow(format!("column {name}: {e}")))
    })
}

fn corrupt(message: String) -> HubError {
    HubError::Store(StoreError::CorruptRow(message))
}

fn gr_no(row: &Row) -> Result<GrNumber> {
    GrNumber::new(col::<String>(row, "gr_no")?).map_err(corrupt)
}

fn charges(row: &Row) -> Result<AncillaryCharges> {
    Ok(AncillaryCharges {
        dd_chrg: col(row, "dd_chrg")?,
        ewb_chrg: col(row, "ewb_chrg")?,
        labour_chrg: col(row, "labour_chrg")?,
        other_chrg: col(row, "other_chrg")?,
    })
}

pub fn city_from_row(row: &Row) -> Result<City> {
    Ok(City {
        id: CityId(col(row, "id")?),
        name: col(row, "name")?,
        code: col(row, "code")?,
    })
}

pub fn branch_from_row(row: &Row) -> Result<Branch> {
    Ok(Branch {
        id: BranchId(col(row, "id")?),
        name: col(row, "name")?,
    })
}

pub fn transport_from_row(row: &Row) -> Result<Transport> {
    Ok(Transport {
        id: TransportId(col(row, "id")?),
        name: col(row, "name")?,
        city_id: col::<Option<i64>>(row, "city_id")?.map(CityId),
        mobile: col(row, "mobile")?,
        address: col(row, "address")?,
    })
}

pub fn hub_rate_from_row(row: &Row) -> Result<HubRate> {
    let mode: String = col(row, "pricing_mode")?;
    Ok(HubRate {
        id: HubRateId(col(row, "id")?),
        transport_id: TransportId(col(row, "transport_id")?),
        destination_city_id: CityId(col(row, "destination_city_id")?),
        goods_type: col(row, "goods_type")?,
        pricing_mode: mode.parse().map_err(corrupt)?,
        rate_per_kg: col(row, "rate_per_kg")?,
        rate_per_pkg: col(row, "rate_per_pkg")?,
        min_charge: col(row, "min_charge")?,
        charges: charges(row)?,
        is_active: col(row, "is_active")?,
        updated_at: col(row, "updated_at")?,
    })
}

pub fn bilty_from_row(row: &Row) -> Result<Bilty> {
    Ok(Bilty {
        gr_no: gr_no(row)?,
        consignor_name: col(row, "consignor_name")?,
        consignee_name: col(row, "consignee_name")?,
        to_city_id: col::<Option<i64>>(row, "to_city_id")?.map(CityId),
        no_of_pkg: col(row, "no_of_pkg")?,
        wt: col(row, "wt")?,
        total: col(row, "total")?,
        payment_mode: col(row, "payment_mode")?,
        contain: col(row, "contain")?,
        bilty_image: col(row, "bilty_image")?,
    })
}

pub fn station_bilty_from_row(row: &Row) -> Result<StationBilty> {
    Ok(StationBilty {
        gr_no: gr_no(row)?,
        consignor: col(row, "consignor")?,
        consignee: col(row, "consignee")?,
        station: col(row, "station")?,
        no_of_packets: col(row, "no_of_packets")?,
        weight: col(row, "weight")?,
        amount: col(row, "amount")?,
        payment_status: col(row, "payment_status")?,
        contents: col(row, "contents")?,
        image_url: col(row, "image_url")?,
    })
}

pub fn challan_from_row(row: &Row) -> Result<Challan> {
    Ok(Challan {
        id: col(row, "id")?,
        challan_no: ChallanNumber::new(col::<String>(row, "challan_no")?).map_err(corrupt)?,
        branch_id: col::<Option<i64>>(row, "branch_id")?.map(BranchId),
        vehicle_no: col(row, "vehicle_no")?,
        driver_name: col(row, "driver_name")?,
        owner_name: col(row, "owner_name")?,
        is_dispatched: col(row, "is_dispatched")?,
        dispatch_date: col(row, "dispatch_date")?,
        is_received_at_hub: col(row, "is_received_at_hub")?,
        received_at_hub_timing: col(row, "received_at_hub_timing")?,
    })
}

fn stage_mark(row: &Row, stage: Stage) -> Result<StageMark> {
    let (flag, at) = stage_columns(stage);
    Ok(StageMark {
        done: col(row, flag)?,
        at: col(row, at)?,
    })
}

pub fn transit_record_from_row(row: &Row) -> Result<TransitRecord> {
    let door = DoorDeliveryInfo {
        vehicle_no: col(row, "door_vehicle_no")?,
        agent_name: col(row, "door_agent_name")?,
        agent_phone: col(row, "door_agent_phone")?,
    };

    Ok(TransitRecord {
        id: TransitRecordId(col(row, "id")?),
        challan_no: ChallanNumber::new(col::<String>(row, "challan_no")?).map_err(corrupt)?,
        gr_no: gr_no(row)?,
        from_branch_id: col::<Option<i64>>(row, "from_branch_id")?.map(BranchId),
        to_branch_id: col::<Option<i64>>(row, "to_branch_id")?.map(BranchId),
        flags: StageFlags {
            out_from_origin: stage_mark(row, Stage::OutFromOrigin)?,
            delivered_at_hub: stage_mark(row, Stage::DeliveredAtHub)?,
            out_from_hub: stage_mark(row, Stage::OutFromHub)?,
            delivered_at_destination: stage_mark(row, Stage::DeliveredAtDestination)?,
            out_for_door_delivery: stage_mark(row, Stage::OutForDoorDelivery)?,
        },
        remarks: col(row, "remarks")?,
        door_delivery: (!door.is_empty()).then_some(door),
    })
}

/// Maps a ledger row; a row carrying both document numbers is rejected
pub fn kaat_from_row(row: &Row) -> Result<KaatRecord> {
    let gr = gr_no(row)?;
    let document = DocumentRef::from_columns(col(row, "pohonch_no")?, col(row, "bilty_number")?)
        .map_err(|e| HubError::Validation(format!("kaat row {gr}: {e}")))?;

    Ok(KaatRecord {
        gr_no: gr,
        document,
        transport_id: col::<Option<i64>>(row, "transport_id")?.map(TransportId),
        hub_rate_id: col::<Option<i64>>(row, "hub_rate_id")?.map(HubRateId),
        kaat: col::<Option<Decimal>>(row, "kaat")?,
        charges: charges(row)?,
        created_by: col(row, "created_by")?,
        created_at: col(row, "created_at")?,
        updated_by: col(row, "updated_by")?,
        updated_at: col(row, "updated_at")?,
    })
}

pub fn stage_event_from_row(row: &Row) -> Result<StageEvent> {
    let stage: String = col(row, "stage")?;
    Ok(StageEvent {
        record_id: TransitRecordId(col(row, "record_id")?),
        stage: stage.parse().map_err(corrupt)?,
        at: col(row, "at")?,
        actor: col(row, "actor")?,
        backfilled: col(row, "backfilled")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_columns_are_distinct() {
        let mut names: Vec<&str> = Stage::ALL
            .iter()
            .flat_map(|s| {
                let (flag, at) = stage_columns(*s);
                [flag, at]
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 10);
    }

    #[test]
    fn test_every_stage_column_is_selected() {
        for stage in Stage::ALL {
            let (flag, at) = stage_columns(stage);
            assert!(TRANSIT_COLUMNS.contains(flag));
            assert!(TRANSIT_COLUMNS.contains(at));
        }
    }
}
