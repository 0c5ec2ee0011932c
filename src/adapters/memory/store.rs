//! In-process store backed by `tokio` locks
//!
//! Holds every table in one [`MemorySeed`] behind a single `RwLock`, so each
//! write (including a bulk transition) is atomic with respect to other
//! callers. Write failures and bulk faults can be injected for tests.

use crate::adapters::database::traits::{
    HubStore, KaatStore, ReferenceStore, ShipmentStore, TransitStore,
};
use crate::adapters::memory::seed::MemorySeed;
use crate::core::bulk::{BulkTransitionKind, BulkTransitionReport};
use crate::core::transit::{StageEvent, StageWrite, TransitionPlan};
use crate::domain::ids::{ChallanNumber, GrNumber, TransitRecordId};
use crate::domain::{
    Bilty, Branch, Challan, City, HubError, HubRate, KaatPatch, KaatRecord, Result, StationBilty,
    StoreError, TransitRecord, Transport,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

/// Fault returned by the next bulk transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkFault {
    /// Report `Rejected` without writing
    Reject(String),

    /// Write only the first record and report `PartiallyApplied`
    Partial,
}

/// In-memory implementation of every store trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemorySeed>,
    fail_writes: AtomicBool,
    bulk_fault: Mutex<Option<BulkFault>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given tables
    pub fn from_seed(seed: MemorySeed) -> Self {
        Self {
            state: RwLock::new(seed),
            ..Default::default()
        }
    }

    /// Create a store from a JSON seed file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_seed_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_seed(MemorySeed::from_file(path)?))
    }

    /// Make every subsequent write fail until reset
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the next bulk transition misbehave
    pub fn inject_bulk_fault(&self, fault: BulkFault) {
        *self.bulk_fault.lock().unwrap_or_else(|e| e.into_inner()) = Some(fault);
    }

    /// Copy of all tables
    pub async fn export(&self) -> MemorySeed {
        self.state.read().await.clone()
    }

    /// Number of ledger rows
    pub async fn kaat_row_count(&self) -> usize {
        self.state.read().await.kaat.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteFailed("memory store is failing writes".to_string()).into());
        }
        Ok(())
    }

    fn take_bulk_fault(&self) -> Option<BulkFault> {
        self.bulk_fault
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

fn contains(gr_nos: &[GrNumber]) -> impl Fn(&GrNumber) -> bool + '_ {
    move |gr| gr_nos.contains(gr)
}

#[async_trait]
impl ReferenceStore for MemoryStore {
    async fn list_cities(&self) -> Result<Vec<City>> {
        Ok(self.state.read().await.cities.clone())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> {
        Ok(self.state.read().await.branches.clone())
    }

    async fn list_transports(&self) -> Result<Vec<Transport>> {
        Ok(self.state.read().await.transports.clone())
    }

    async fn list_active_hub_rates(&self) -> Result<Vec<HubRate>> {
        Ok(self
            .state
            .read()
            .await
            .hub_rates
            .iter()
            .filter(|r| r.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn find_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<Bilty>> {
        let wanted = contains(gr_nos);
        Ok(self
            .state
            .read()
            .await
            .bilties
            .iter()
            .filter(|b| wanted(&b.gr_no))
            .cloned()
            .collect())
    }

    async fn find_station_bilties(&self, gr_nos: &[GrNumber]) -> Result<Vec<StationBilty>> {
        let wanted = contains(gr_nos);
        Ok(self
            .state
            .read()
            .await
            .station_bilties
            .iter()
            .filter(|b| wanted(&b.gr_no))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TransitStore for MemoryStore {
    async fn get_challan(&self, challan_no: &ChallanNumber) -> Result<Option<Challan>> {
        Ok(self
            .state
            .read()
            .await
            .challans
            .iter()
            .find(|c| &c.challan_no == challan_no)
            .cloned())
    }

    async fn mark_challan_received(
        &self,
        challan_no: &ChallanNumber,
        at: DateTime<Utc>,
    ) -> Result<Challan> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let challan = state
            .challans
            .iter_mut()
            .find(|c| &c.challan_no == challan_no)
            .ok_or_else(|| HubError::NotFound(format!("challan {challan_no}")))?;

        challan.mark_received_at_hub(at);
        Ok(challan.clone())
    }

    async fn list_transit_records(&self, challan_no: &ChallanNumber) -> Result<Vec<TransitRecord>> {
        Ok(self
            .state
            .read()
            .await
            .transit_records
            .iter()
            .filter(|r| &r.challan_no == challan_no)
            .cloned()
            .collect())
    }

    async fn get_transit_record(&self, id: TransitRecordId) -> Result<Option<TransitRecord>> {
        Ok(self
            .state
            .read()
            .await
            .transit_records
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn apply_stage_write(&self, write: &StageWrite) -> Result<Vec<StageEvent>> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let record = state
            .transit_records
            .iter_mut()
            .find(|r| r.id == write.record_id)
            .ok_or_else(|| HubError::NotFound(format!("transit record {}", write.record_id)))?;

        let events = write.apply_to(record);
        state.stage_events.extend(events.iter().cloned());
        Ok(events)
    }

    async fn update_remarks(&self, id: TransitRecordId, remarks: Option<&str>) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.write().await;
        let record = state
            .transit_records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| HubError::NotFound(format!("transit record {id}")))?;

        record.remarks = remarks.map(str::to_string);
        Ok(())
    }

    async fn bulk_transition(
        &self,
        ids: &[TransitRecordId],
        kind: BulkTransitionKind,
        actor: &str,
    ) -> Result<BulkTransitionReport> {
        self.check_writable()?;
        let fault = self.take_bulk_fault();
        if let Some(BulkFault::Reject(reason)) = &fault {
            return Ok(BulkTransitionReport::Rejected {
                reason: reason.clone(),
            });
        }

        let mut state = self.state.write().await;
        let known: HashSet<TransitRecordId> = state.transit_records.iter().map(|r| r.id).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !known.contains(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Ok(BulkTransitionReport::Rejected {
                reason: format!("unknown transit record ids: {}", missing.join(", ")),
            });
        }

        let limit = match fault {
            Some(BulkFault::Partial) => 1,
            _ => ids.len(),
        };

        let target = kind.target_stage();
        let applied_at = Utc::now();
        let mut updated = 0;
        let mut events = Vec::new();

        for id in ids.iter().take(limit) {
            let Some(record) = state.transit_records.iter_mut().find(|r| r.id == *id) else {
                continue;
            };
            if let Some(plan) = TransitionPlan::for_target(&record.flags, target) {
                let written = plan.into_write(*id, applied_at, actor).apply_to(record);
                if !written.is_empty() {
                    updated += 1;
                }
                events.extend(written);
            }
        }
        state.stage_events.extend(events);

        if limit < ids.len() {
            return Ok(BulkTransitionReport::PartiallyApplied {
                updated,
                failed: ids.len() - limit,
            });
        }
        Ok(BulkTransitionReport::Applied {
            updated,
            applied_at,
        })
    }

    async fn list_stage_events(&self, id: TransitRecordId) -> Result<Vec<StageEvent>> {
        Ok(self
            .state
            .read()
            .await
            .stage_events
            .iter()
            .filter(|e| e.record_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl KaatStore for MemoryStore {
    async fn get_kaat(&self, gr_no: &GrNumber) -> Result<Option<KaatRecord>> {
        Ok(self
            .state
            .read()
            .await
            .kaat
            .iter()
            .find(|k| &k.gr_no == gr_no)
            .cloned())
    }

    async fn list_kaat(&self, gr_nos: &[GrNumber]) -> Result<Vec<KaatRecord>> {
        let wanted = contains(gr_nos);
        Ok(self
            .state
            .read()
            .await
            .kaat
            .iter()
            .filter(|k| wanted(&k.gr_no))
            .cloned()
            .collect())
    }

    async fn upsert_kaat(
        &self,
        gr_no: &GrNumber,
        patch: &KaatPatch,
        actor: &str,
        at: DateTime<Utc>,
    ) -> Result<KaatRecord> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        if let Some(existing) = state.kaat.iter_mut().find(|k| &k.gr_no == gr_no) {
            existing.update(patch, actor, at);
            return Ok(existing.clone());
        }

        let record = KaatRecord::create(gr_no.clone(), patch, actor, at);
        state.kaat.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl HubStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
