//! Transit commands: challan receipt, stage transitions, remarks, history

use crate::cli::commands::{confirm, open_session, report_failure};
use crate::core::bulk::BulkTransitionKind;
use crate::core::transit::{TransitionOutcome, TransitionRequest};
use crate::domain::{ChallanNumber, DoorDeliveryInfo, HubError, Stage, TransitRecordId};
use clap::Args;

/// Arguments for the receive command
#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Challan number
    pub challan: ChallanNumber,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ReceiveArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let mut challan = match engine.stores.transit.get_challan(&self.challan).await {
            Ok(Some(c)) => c,
            Ok(None) => {
                println!("❌ Challan {} not found", self.challan);
                return Ok(3);
            }
            Err(e) => return Ok(report_failure("Loading the challan", &e)),
        };

        if challan.is_received_at_hub {
            println!("ℹ️  Challan {} was already received at the hub", self.challan);
            return Ok(0);
        }

        if !confirm(
            &format!("Mark challan {} as received at the hub?", self.challan),
            self.yes,
        )? {
            println!("Cancelled.");
            return Ok(0);
        }

        match engine
            .tracker
            .receive_challan(&mut challan, &session.actor)
            .await
        {
            Ok(true) => {
                println!("✅ Challan {} received at the hub", self.challan);
                Ok(0)
            }
            Ok(false) => {
                println!("ℹ️  Challan {} was already received at the hub", self.challan);
                Ok(0)
            }
            Err(e) => Ok(report_failure("Receiving the challan", &e)),
        }
    }
}

/// Arguments for the transition command
#[derive(Args, Debug)]
pub struct TransitionArgs {
    /// Transit record id
    pub record_id: TransitRecordId,

    /// Target stage (out-from-origin, delivered-at-hub, out-from-hub,
    /// delivered-at-destination, out-for-door-delivery)
    pub stage: Stage,

    /// Door-delivery vehicle number
    #[arg(long)]
    pub vehicle_no: Option<String>,

    /// Door-delivery agent name
    #[arg(long)]
    pub agent_name: Option<String>,

    /// Door-delivery agent phone
    #[arg(long)]
    pub agent_phone: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl TransitionArgs {
    fn door_delivery(&self) -> Option<DoorDeliveryInfo> {
        let info = DoorDeliveryInfo {
            vehicle_no: self.vehicle_no.clone(),
            agent_name: self.agent_name.clone(),
            agent_phone: self.agent_phone.clone(),
        };
        (!info.is_empty()).then_some(info)
    }

    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        if self.door_delivery().is_some() && self.stage != Stage::OutForDoorDelivery {
            println!("❌ Door-delivery details only apply to out-for-door-delivery");
            return Ok(3);
        }

        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let mut record = match engine.stores.transit.get_transit_record(self.record_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                println!("❌ Transit record {} not found", self.record_id);
                return Ok(3);
            }
            Err(e) => return Ok(report_failure("Loading the transit record", &e)),
        };

        if record.flags.is_done(self.stage) {
            println!(
                "ℹ️  GR {} is already marked {}",
                record.gr_no,
                self.stage
            );
            return Ok(0);
        }

        let confirmed = confirm(
            &format!("Mark GR {} as {}?", record.gr_no, self.stage),
            self.yes,
        )?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(0);
        }

        let mut request = TransitionRequest::confirmed(self.stage, session.actor.clone());
        if let Some(info) = self.door_delivery() {
            request = request.with_door_delivery(info);
        }

        match engine.tracker.transition(&mut record, request).await {
            Ok(TransitionOutcome::Applied { at, events }) => {
                println!(
                    "✅ GR {} marked {} at {}",
                    record.gr_no,
                    self.stage,
                    at.format("%Y-%m-%d %H:%M:%S")
                );
                for event in events.iter().filter(|e| e.backfilled) {
                    println!("   also marked {} (backfilled)", event.stage);
                }
                println!("   Status: {}", record.display_status());
                Ok(0)
            }
            Ok(TransitionOutcome::AlreadyApplied) => {
                println!("ℹ️  GR {} is already marked {}", record.gr_no, self.stage);
                Ok(0)
            }
            Err(e) => Ok(report_failure("The transition", &e)),
        }
    }
}

/// Arguments for the bulk-transition command
#[derive(Args, Debug)]
pub struct BulkTransitionArgs {
    /// Transition kind (branch, out, delivered)
    pub kind: BulkTransitionKind,

    /// Transit record ids
    #[arg(required = true)]
    pub ids: Vec<TransitRecordId>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl BulkTransitionArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        if !confirm(
            &format!(
                "Mark {} shipment(s) as {}?",
                self.ids.len(),
                self.kind.target_stage()
            ),
            self.yes,
        )? {
            println!("Cancelled.");
            return Ok(0);
        }

        let mut records = Vec::with_capacity(self.ids.len());
        for id in &self.ids {
            match engine.stores.transit.get_transit_record(*id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => return Ok(report_failure("Loading transit records", &e)),
            }
        }

        match engine
            .bulk
            .transition(records.iter_mut(), &self.ids, self.kind, &session.actor)
            .await
        {
            Ok(summary) => {
                println!(
                    "✅ {} of {} shipment(s) marked {} at {}",
                    summary.updated,
                    summary.requested,
                    self.kind.target_stage(),
                    summary.applied_at.format("%Y-%m-%d %H:%M:%S")
                );
                if summary.unchanged() > 0 {
                    println!("   {} already had that stage", summary.unchanged());
                }
                Ok(0)
            }
            Err(e @ HubError::BulkRejected(_)) => {
                println!("❌ Bulk transition rejected; nothing was changed");
                println!("   Reason: {e}");
                Ok(3)
            }
            Err(e) => Ok(report_failure("The bulk transition", &e)),
        }
    }
}

/// Arguments for the remarks command
#[derive(Args, Debug)]
pub struct RemarksArgs {
    /// Transit record id
    pub record_id: TransitRecordId,

    /// New remarks; omit to clear
    pub text: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl RemarksArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let mut record = match engine.stores.transit.get_transit_record(self.record_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                println!("❌ Transit record {} not found", self.record_id);
                return Ok(3);
            }
            Err(e) => return Ok(report_failure("Loading the transit record", &e)),
        };

        let prompt = match &self.text {
            Some(_) => format!("Replace the remarks of GR {}?", record.gr_no),
            None => format!("Clear the remarks of GR {}?", record.gr_no),
        };
        if !confirm(&prompt, self.yes)? {
            println!("Cancelled.");
            return Ok(0);
        }

        match engine
            .tracker
            .update_remarks(&mut record, self.text.clone())
            .await
        {
            Ok(()) => {
                match &record.remarks {
                    Some(text) => println!("✅ Remarks for GR {} set: {text}", record.gr_no),
                    None => println!("✅ Remarks for GR {} cleared", record.gr_no),
                }
                Ok(0)
            }
            Err(e) => Ok(report_failure("Updating remarks", &e)),
        }
    }
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Transit record id
    pub record_id: TransitRecordId,
}

impl HistoryArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let events = match session.engine.tracker.history(self.record_id).await {
            Ok(events) => events,
            Err(e) => return Ok(report_failure("Loading stage history", &e)),
        };

        if events.is_empty() {
            println!("No stage history for record {}.", self.record_id);
            return Ok(0);
        }

        println!("{:<22} {:<26} {:<16} {}", "At", "Stage", "Actor", "");
        println!("{}", "-".repeat(76));
        for event in events {
            println!(
                "{:<22} {:<26} {:<16} {}",
                event.at.format("%Y-%m-%d %H:%M:%S"),
                event.stage,
                event.actor,
                if event.backfilled { "backfilled" } else { "" }
            );
        }
        Ok(0)
    }
}
