//! PostgreSQL adapter implementing the store traits

use crate::adapters::database::traits::{
    HubStore, KaatStore, ReferenceStore, ShipmentStore, TransitStore,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    bilty_from_row, branch_from_row, challan_from_row, city_from_row, hub_rate_from_row,
    kaat_from_row, stage_columns, stage_event_from_row, station_bilty_from_row,
    transit_record_from_row, transport_from_row, KAAT_COLUMNS, TRANSIT_COLUMNS,
};
use crate::core::bulk::{BulkTransitionKind, BulkTransitionReport};
use crate::core::transit::{sort_timeline, StageEvent, StageWrite, TransitionPlan};
use crate::domain::ids::{ChallanNumber, GrNumber, TransitRecordId};
use crate::domain::{
    Bilty, Branch, Challan, City, DocumentRef, HubError, HubRate, KaatPatch, KaatRecord, Result,
    Stage, StationBilty, StoreError, TransitRecord, Transport,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_postgres::Transaction;

fn query_err(e: tokio_postgres::Error) -> HubError {
    StoreError::QueryFailed(e.to_string()).into()
}

fn write_err(e: tokio_postgres::Error) -> HubError {
    StoreError::WriteFailed(e.to_string()).into()
}

fn gr_strings(gr_nos: &[GrNumber]) -> Vec<String> {
    gr_nos.iter().map(|g| g.as_str().to_string()).collect()
}

/// PostgreSQL implementation of every store trait
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn lock_record(
        tx: &Transaction<'_>,
        id: TransitRecordId,
    ) -> Result<Option<TransitRecord>> {
        let sql = format!("SELECT {TRANSIT_COLUMNS} FROM transit_records WHERE id = $1 FOR UPDATE");
        let row = tx.query_opt(&sql, &[&id.0]).await.map_err(query_err)?;
        row.as_ref().map(transit_record_from_row).transpose()
    }

    /// Write every flag pair, door-delivery details and events of one record
    async fn store_record(
        tx: &Transaction<'_>,
        record: &TransitRecord,
        events: &[StageEvent],
    ) -> Result<()> {
        let mut assignments = Vec::new();
        let mut params: Vec<Box<dyn tokio_postgres::types::ToSql + Sync + Send>> = Vec::new();
        for stage in Stage::ALL {
            let (flag, at) = stage_columns(stage);
            let mark = record.flags.get(stage);
            params.push(Box::new(mark.done));
            assignments.push(format!("{flag} = ${}", params.len()));
            params.push(Box::new(mark.at));
            assignments.push(format!("{at} = ${}", params.len()));
        }

        let door = record.door_delivery.clone().unwrap_or_default();
        for (column, value) in [
            ("door_vehicle_no", door.vehicle_no),
            ("door_agent_name", door.agent_name),
            ("door_agent_phone", door.agent_phone),
        ] {
            params.push(Box::new(value));
            assignments.push(format!("{column} = ${}", params.len()));
        }

        params.push(Box::new(record.id.0));
        let sql = format!(
            "UPDATE transit_records SET {} WHERE id = ${}",
            assignments.join(", "),
            params.len()
        );
        let refs: Vec<&(dyn tokio_postgres::types::ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect();
        tx.execute(&sql, &refs).await.map_err(write_err)?;

        for event in events {
            tx.execute(
                "INSERT INTO stage_events (record_id, stage, at, actor, backfilled) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &event.record_id.0,
                    &event.stage.as_str(),
                    &event.at,
                    &event.actor,
                    &event.backfilled,
                ],
            )
            .await
            .map_err(write_err)?;
        }
        Ok(())
    }

    async fn write_kaat(
        tx: &Transaction<'_>,
        record: &KaatRecord,
        insert: bool,
    ) -> Result<u64> {
        let (pohonch_no, bilty_number) = DocumentRef::to_columns(record.document.as_ref());
        let transport_id = record.transport_id.map(|t| t.0);
        let hub_rate_id = record.hub_rate_id.map(|h| h.0);
        let sql = if insert {
            "INSERT INTO kaat (gr_no, pohonch_no, bilty_number, transport_id, hub_rate_id, kaat, \
             dd_chrg, ewb_chrg, labour_chrg, other_chrg, created_by, created_at, updated_by, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             ON CONFLICT (gr_no) DO NOTHING"
        } else {
            "UPDATE kaat SET pohonch_no = $2, bilty_number = $3, transport_id = $4, hub_rate_id = $5, \
             kaat = $6, dd_chrg = $7, ewb_chrg = $8, labour_chrg = $9, other_chrg = $10, \
             created_by = $11, created_at = $12, updated_by = $13, updated_at = $14 \
             WHERE gr_no = $1"
        };
        tx.execute(
            sql,
            &[
                &record.gr_no.as_str(),
                &pohonch_no,
                &bilty_number,
                &transport_id,
                &hub_rate_id,
                &record.kaat,
                &record.charges.dd_chrg,
                &record.charges.ewb_chrg,
                &record.charges.labour_chrg,
                &record.charges.other_chrg,
                &record.created_by,
                &record.created_at,
                &record.updated_by,
                &record.updated_at,
            ],
        )
        .await
        .map_err(write_err)
    }
}

#[async_trait]
impl ReferenceStore for PostgreSQLAdapter {
    async fn list_cities(&self) -> Result<Vec<City>> {
        let rows = self
            .client
            .query("SELECT id, name, code FROM cities ORDER BY id", &[])
            .await?;
        rows.iter().map(city_from_row).collect()
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        let rows = self
            .client
            .query("SELECT id, name FROM branches ORDER BY id", &[])
            .await?;
        rows.iter().map(branch_from_row).collect()
    }

    async fn list_transports(&self) -> Result<Vec<Transport>> {
        let rows = self
            .client
            .query(
                "SELECT id, name, city_id, mobile, address FROM transports ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(transport_from_row).collect()
    }

    async fn list_active_hub_rates(&self) -> Result<Vec<HubRate>> {
        let rows = self
            .client
            .query(
                "SELECT id, transport_id, destination_city_id, goods_type, pricing_mode, \
                 rate_per_kg, rate_per_pkg, min_charge, dd_chrg, ewb_chrg, labour_chrg, \
                 other_chrg, is_active, updated_at \
                 FROM hub_rates WHERE is_active ORDER BY id",
                &[],
            )
            .await?;
        rows.iter().map(hub_rate_from_row).collect()
    }
}

#[async_trait]
impl ShipmentStore for PostgreSQLAdapter {
    async fn find_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<Bilty>> {
        if gr_nos.is_empty() {
            return Ok(Vec::new());
        }
        let keys = gr_strings(gr_nos);
        let rows = self
            .client
            .query(
                "SELECT gr_no, consignor_name, consignee_name, to_city_id, no_of_pkg, wt, total, \
                 payment_mode, contain, bilty_image FROM bilties WHERE gr_no = ANY($1)",
                &[&keys],
            )
            .await?;
        rows.iter().map(bilty_from_row).collect()
    }

    async fn find_station_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<StationBilty>> {
        if gr_nos.is_empty() {
            return Ok(Vec::new());
        }
        let keys = gr_strings(gr_nos);
        let rows = self
            .client
            .query(
                "SELECT gr_no, consignor, consignee, station, no_of_packets, weight, amount, \
                 payment_status, contents, image_url FROM station_bilties WHERE gr_no = ANY($1)",
                &[&keys],
            )
            .await?;
        rows.iter().map(station_bilty_from_row).collect()
    }
}

const CHALLAN_COLUMNS: &str = "id, challan_no, branch_id, vehicle_no, driver_name, owner_name, \
    is_dispatched, dispatch_date, is_received_at_hub, received_at_hub_timing";

#[async_trait]
impl TransitStore for PostgreSQLAdapter {
    async fn get_challan(&self, challan_no: &ChallanNumber) -> Result<Option<Challan>> {
        let sql = format!("SELECT {CHALLAN_COLUMNS} FROM challans WHERE challan_no = $1");
        let rows = self.client.query(&sql, &[&challan_no.as_str()]).await?;
        rows.first().map(challan_from_row).transpose()
    }

    async fn mark_challan_received(
        &self,
        challan_no: &ChallanNumber,
        at: DateTime<Utc>,
    ) -> Result<Challan> {
        // The NOT guard keeps the first receipt timestamp
        let sql = format!(
            "UPDATE challans SET is_received_at_hub = TRUE, received_at_hub_timing = $2 \
             WHERE challan_no = $1 AND NOT is_received_at_hub RETURNING {CHALLAN_COLUMNS}"
        );
        let client = self.client.get_connection().await?;
        let updated = client
            .query_opt(&sql, &[&challan_no.as_str(), &at])
            .await
            .map_err(write_err)?;
        if let Some(row) = updated {
            return challan_from_row(&row);
        }

        self.get_challan(challan_no)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("challan {challan_no}")))
    }

    async fn list_transit_records(&self, challan_no: &ChallanNumber) -> Result<Vec<TransitRecord>> {
        let sql =
            format!("SELECT {TRANSIT_COLUMNS} FROM transit_records WHERE challan_no = $1 ORDER BY id");
        let rows = self.client.query(&sql, &[&challan_no.as_str()]).await?;
        rows.iter().map(transit_record_from_row).collect()
    }

    async fn get_transit_record(&self, id: TransitRecordId) -> Result<Option<TransitRecord>> {
        let sql = format!("SELECT {TRANSIT_COLUMNS} FROM transit_records WHERE id = $1");
        let rows = self.client.query(&sql, &[&id.0]).await?;
        rows.first().map(transit_record_from_row).transpose()
    }

    async fn apply_stage_write(&self, write: &StageWrite) -> Result<Vec<StageEvent>> {
        let mut client = self.client.get_connection().await?;
        let tx = client.transaction().await.map_err(write_err)?;

        let mut record = Self::lock_record(&*tx, write.record_id)
            .await?
            .ok_or_else(|| HubError::NotFound(format!("transit record {}", write.record_id)))?;

        let events = write.apply_to(&mut record);
        if !events.is_empty() {
            Self::store_record(&*tx, &record, &events).await?;
        }
        tx.commit().await.map_err(write_err)?;
        Ok(events)
    }

    async fn update_remarks(&self, id: TransitRecordId, remarks: Option<&str>) -> Result<()> {
        let affected = self
            .client
            .execute(
                "UPDATE transit_records SET remarks = $2 WHERE id = $1",
                &[&id.0, &remarks],
            )
            .await?;
        if affected == 0 {
            return Err(HubError::NotFound(format!("transit record {id}")));
        }
        Ok(())
    }

    async fn bulk_transition(
        &self,
        ids: &[TransitRecordId],
        kind: BulkTransitionKind,
        actor: &str,
    ) -> Result<BulkTransitionReport> {
        let mut client = self.client.get_connection().await?;
        let tx = client.transaction().await.map_err(write_err)?;

        let keys: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let sql = format!(
            "SELECT {TRANSIT_COLUMNS} FROM transit_records WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        );
        let rows = tx.query(&sql, &[&keys]).await.map_err(query_err)?;
        let records = rows
            .iter()
            .map(transit_record_from_row)
            .collect::<Result<Vec<_>>>()?;

        if records.len() != ids.len() {
            let found: Vec<TransitRecordId> = records.iter().map(|r| r.id).collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_string())
                .collect();
            // Dropping the transaction rolls it back
            return Ok(BulkTransitionReport::Rejected {
                reason: format!("unknown transit record ids: {}", missing.join(", ")),
            });
        }

        let applied_at: DateTime<Utc> = tx
            .query_one("SELECT now()", &[])
            .await
            .map_err(query_err)?
            .get(0);

        let target = kind.target_stage();
        let mut updated = 0;
        for mut record in records {
            let Some(plan) = TransitionPlan::for_target(&record.flags, target) else {
                continue;
            };
            let events = plan.into_write(record.id, applied_at, actor).apply_to(&mut record);
            if events.is_empty() {
                continue;
            }
            Self::store_record(&*tx, &record, &events).await?;
            updated += 1;
        }

        tx.commit().await.map_err(write_err)?;
        Ok(BulkTransitionReport::Applied {
            updated,
            applied_at,
        })
    }

    async fn list_stage_events(&self, id: TransitRecordId) -> Result<Vec<StageEvent>> {
        let rows = self
            .client
            .query(
                "SELECT record_id, stage, at, actor, backfilled FROM stage_events \
                 WHERE record_id = $1 ORDER BY at, id",
                &[&id.0],
            )
            .await?;
        let mut events = rows
            .iter()
            .map(stage_event_from_row)
            .collect::<Result<Vec<_>>>()?;
        sort_timeline(&mut events);
        Ok(events)
    }
}

#[async_trait]
impl KaatStore for PostgreSQLAdapter {
    async fn get_kaat(&self, gr_no: &GrNumber) -> Result<Option<KaatRecord>> {
        let sql = format!("SELECT {KAAT_COLUMNS} FROM kaat WHERE gr_no = $1");
        let rows = self.client.query(&sql, &[&gr_no.as_str()]).await?;
        rows.first().map(kaat_from_row).transpose()
    }

    async fn list_kaat(&self, gr_nos: &[GrNumber]) -> Result<Vec<KaatRecord>> {
        if gr_nos.is_empty() {
            return Ok(Vec::new());
        }
        let keys = gr_strings(gr_nos);
        let sql = format!("SELECT {KAAT_COLUMNS} FROM kaat WHERE gr_no = ANY($1)");
        let rows = self.client.query(&sql, &[&keys]).await?;
        rows.iter().map(kaat_from_row).collect()
    }

    async fn upsert_kaat(
        &self,
        gr_no: &GrNumber,
        patch: &KaatPatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<KaatRecord> {
        let mut client = self.client.get_connection().await?;
        let tx = client.transaction().await.map_err(write_err)?;
        let select = format!("SELECT {KAAT_COLUMNS} FROM kaat WHERE gr_no = $1 FOR UPDATE");

        // Second pass only runs when a concurrent insert won the race
        for _ in 0..2 {
            let existing = tx
                .query_opt(&select, &[&gr_no.as_str()])
                .await
                .map_err(query_err)?;

            match existing {
                Some(row) => {
                    let mut record = kaat_from_row(&row)?;
                    record.update(patch, actor, at);
                    Self::write_kaat(&*tx, &record, false).await?;
                    tx.commit().await.map_err(write_err)?;
                    return Ok(record);
                }
                None => {
                    let record = KaatRecord::create(gr_no.clone(), patch, actor, at);
                    if Self::write_kaat(&*tx, &record, true).await? == 1 {
                        tx.commit().await.map_err(write_err)?;
                        return Ok(record);
                    }
                }
            }
        }

        Err(StoreError::WriteFailed(format!("could not upsert kaat row for GR {gr_no}")).into())
    }
}

#[async_trait]
impl HubStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
