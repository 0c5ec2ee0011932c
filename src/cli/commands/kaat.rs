//! Charge ledger commands: carrier assignment, documents, pricing

use crate::cli::commands::{confirm, open_session, report_failure};
use crate::domain::{ChallanNumber, DocumentRef, GrNumber, RowFailure, TransportId};
use clap::{ArgGroup, Args};

fn print_failures(errors: &[RowFailure]) {
    for failure in errors.iter().take(10) {
        println!("   - GR {}: {}", failure.gr_no, failure.message);
    }
    if errors.len() > 10 {
        println!("   ... and {} more", errors.len() - 10);
    }
}

/// Arguments for the set-carrier command
#[derive(Args, Debug)]
pub struct SetCarrierArgs {
    /// GR number
    pub gr: GrNumber,

    /// Transport (carrier) id
    pub carrier: TransportId,

    /// Challan the shipment travels on
    #[arg(long)]
    pub challan: ChallanNumber,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl SetCarrierArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let board = match engine.boards.load(&self.challan).await {
            Ok(b) => b,
            Err(e) => return Ok(report_failure("Loading the board", &e)),
        };
        let Some(shipment) = board.shipment(&self.gr) else {
            println!("❌ GR {} is not on challan {}", self.gr, self.challan);
            return Ok(3);
        };

        let reference = match engine.reference.snapshot().await {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Loading reference data", &e)),
        };
        let Some(transport) = reference.transport(self.carrier) else {
            println!("❌ Transport {} not found", self.carrier);
            return Ok(3);
        };

        if !confirm(
            &format!("Assign {} to GR {}?", transport.name, self.gr),
            self.yes,
        )? {
            println!("Cancelled.");
            return Ok(0);
        }

        match engine
            .ledger
            .assign_carrier(shipment, self.carrier, &session.actor)
            .await
        {
            Ok(record) => {
                println!("✅ GR {} assigned to {}", self.gr, transport.name);
                match record.hub_rate_id {
                    Some(rate) => println!(
                        "   Hub rate #{rate}, charges {}",
                        record.charges.total()
                    ),
                    None => println!("   ⚠️  No hub rate configured for this carrier and destination"),
                }
                Ok(0)
            }
            Err(e) => Ok(report_failure("Assigning the carrier", &e)),
        }
    }
}

/// Arguments for the set-document command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("document").required(true).multiple(false).args(["pohonch", "bilty"])))]
pub struct SetDocumentArgs {
    /// GR number
    pub gr: GrNumber,

    /// Pohonch (delivery receipt) number
    #[arg(long)]
    pub pohonch: Option<String>,

    /// Bilty number
    #[arg(long)]
    pub bilty: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl SetDocumentArgs {
    fn document(&self) -> Option<DocumentRef> {
        match (&self.pohonch, &self.bilty) {
            (Some(p), None) => Some(DocumentRef::Pohonch(p.trim().to_string())),
            (None, Some(b)) => Some(DocumentRef::Bilty(b.trim().to_string())),
            _ => None,
        }
    }

    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let document = match self.document() {
            Some(DocumentRef::Pohonch(n)) | Some(DocumentRef::Bilty(n)) if n.is_empty() => {
                println!("❌ Document number must not be empty");
                return Ok(3);
            }
            Some(doc) => doc,
            None => {
                println!("❌ Give exactly one of --pohonch or --bilty");
                return Ok(3);
            }
        };

        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let label = match &document {
            DocumentRef::Pohonch(n) => format!("pohonch {n}"),
            DocumentRef::Bilty(n) => format!("bilty {n}"),
        };
        if !confirm(&format!("Set {label} on GR {}?", self.gr), self.yes)? {
            println!("Cancelled.");
            return Ok(0);
        }

        match session
            .engine
            .ledger
            .set_document(&self.gr, document, &session.actor)
            .await
        {
            Ok(_) => {
                println!("✅ GR {} now carries {label}", self.gr);
                Ok(0)
            }
            Err(e) => Ok(report_failure("Setting the document", &e)),
        }
    }
}

/// Arguments for the auto-assign command
#[derive(Args, Debug)]
pub struct AutoAssignArgs {
    /// Challan number
    pub challan: ChallanNumber,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl AutoAssignArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let board = match engine.boards.load(&self.challan).await {
            Ok(b) => b,
            Err(e) => return Ok(report_failure("Loading the board", &e)),
        };

        if !confirm(
            &format!(
                "Auto-assign carriers for {} shipment(s) on challan {}?",
                board.shipments.len(),
                self.challan
            ),
            self.yes,
        )? {
            println!("Cancelled.");
            return Ok(0);
        }

        let summary = match engine.assigner.run(&board.shipments, &session.actor).await {
            Ok(s) => s,
            Err(e) => return Ok(report_failure("Auto-assignment", &e)),
        };

        println!("📊 Auto-assignment:");
        println!("   Considered: {}", summary.considered);
        println!("   Assigned: {}", summary.assigned);
        if summary.assigned_without_rate > 0 {
            println!("   Assigned without a rate: {}", summary.assigned_without_rate);
        }
        println!("   Already assigned: {}", summary.already_assigned);
        println!("   Ambiguous or no carrier: {}", summary.ambiguous);

        if summary.is_successful() {
            println!("✅ Auto-assignment completed");
            Ok(0)
        } else {
            println!("⚠️  {} row(s) failed:", summary.failed);
            print_failures(&summary.errors);
            Ok(1)
        }
    }
}

/// Arguments for the apply-rates command
#[derive(Args, Debug)]
pub struct ApplyRatesArgs {
    /// Challan number
    pub challan: ChallanNumber,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ApplyRatesArgs {
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let board = match engine.boards.load(&self.challan).await {
            Ok(b) => b,
            Err(e) => return Ok(report_failure("Loading the board", &e)),
        };

        if !confirm(
            &format!(
                "Apply hub rates to {} shipment(s) on challan {}?",
                board.shipments.len(),
                self.challan
            ),
            self.yes,
        )? {
            println!("Cancelled.");
            return Ok(0);
        }

        let summary = match engine.bulk.apply_rates(&board.shipments, &session.actor).await {
            Ok(s) => s,
            Err(e) => return Ok(report_failure("Applying hub rates", &e)),
        };

        println!("📊 Rate application:");
        println!("   Selected: {}", summary.selected);
        println!("   Applied: {}", summary.applied);
        println!("   Unchanged: {}", summary.unchanged);
        println!("   Skipped, no carrier: {}", summary.skipped_no_carrier);
        println!("   Skipped, no rate: {}", summary.skipped_no_rate);

        if summary.is_successful() {
            println!("✅ Rate application completed");
            Ok(0)
        } else {
            println!("⚠️  {} row(s) failed:", summary.failed);
            print_failures(&summary.errors);
            Ok(1)
        }
    }
}
