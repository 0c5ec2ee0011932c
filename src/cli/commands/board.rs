//! Board command implementation
//!
//! Prints every shipment of a challan with its reconciled data, delivery
//! status and ledger state.

use crate::cli::commands::{open_session, report_failure};
use crate::domain::ChallanNumber;
use clap::Args;
use rust_decimal::Decimal;

/// Arguments for the board command
#[derive(Args, Debug)]
pub struct BoardArgs {
    /// Challan number
    pub challan: ChallanNumber,

    /// Print shipments as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl BoardArgs {
    /// Execute the board command
    pub async fn execute(&self, config_path: &str, actor: Option<&str>) -> anyhow::Result<i32> {
        tracing::info!(challan_no = %self.challan, "Loading board");

        let session = match open_session(config_path, actor).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };
        let engine = &session.engine;

        let board = match engine.boards.load(&self.challan).await {
            Ok(b) => b,
            Err(e) => return Ok(report_failure("Loading the board", &e)),
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&board.shipments)?);
            return Ok(0);
        }

        let reference = match engine.reference.snapshot().await {
            Ok(r) => r,
            Err(e) => return Ok(report_failure("Loading reference data", &e)),
        };

        let challan = &board.challan;
        println!("🚚 Challan {}", challan.challan_no);
        println!(
            "   Vehicle: {}   Driver: {}   Received at hub: {}",
            cell(challan.vehicle_no.as_deref()),
            cell(challan.driver_name.as_deref()),
            match challan.received_at_hub_timing {
                Some(at) if challan.is_received_at_hub => at.format("%Y-%m-%d %H:%M").to_string(),
                _ => "no".to_string(),
            }
        );
        println!();
        println!(
            "{:<8} {:<12} {:<16} {:<22} {:<20} {:<14} {:>5} {:>9} {:<18} {:>10}",
            "Record", "GR No", "Source", "Status", "Consignee", "Destination", "Pkgs", "Weight",
            "Carrier", "Kaat"
        );
        println!("{}", "-".repeat(146));

        for shipment in &board.shipments {
            let ledger = board.kaat.get(shipment.gr_no());
            let carrier = ledger
                .and_then(|row| row.transport_id)
                .map(|id| {
                    reference
                        .transport(id)
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| format!("#{id}"))
                });
            let status = if shipment.transit.flags.skipped_stages().is_empty() {
                shipment.display_status().to_string()
            } else {
                format!("{} ⚠️", shipment.display_status())
            };

            println!(
                "{:<8} {:<12} {:<16} {:<22} {:<20} {:<14} {:>5} {:>9} {:<18} {:>10}",
                shipment.transit.id,
                shipment.gr_no(),
                shipment.source,
                status,
                cell(shipment.consignee.as_deref()),
                cell(shipment.destination_city.as_ref().map(|c| c.name.as_str())),
                cell(shipment.packages),
                cell(shipment.weight.map(|w| w.normalize())),
                cell(carrier),
                cell(ledger.and_then(|row| row.kaat)),
            );
        }

        let summary = board.summary();
        let total_kaat: Decimal = board.kaat.values().filter_map(|row| row.kaat).sum();

        println!();
        println!("Summary:");
        println!("  Shipments: {}", summary.total);
        for (status, count) in &summary.by_status {
            println!("  {status}: {count}");
        }
        for (source, count) in &summary.by_source {
            println!("  Source {source}: {count}");
        }
        if summary.reconciliation_gaps > 0 {
            println!(
                "  ⚠️  {} GR number(s) found in neither source table",
                summary.reconciliation_gaps
            );
        }
        if summary.with_skipped_stages > 0 {
            println!(
                "  ⚠️  {} shipment(s) have skipped stages",
                summary.with_skipped_stages
            );
        }
        println!("  With carrier: {}", summary.with_carrier);
        println!("  Priced: {} (total kaat {})", summary.priced, total_kaat);

        Ok(0)
    }
}
