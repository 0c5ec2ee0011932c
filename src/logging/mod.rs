//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - console output plus an optional JSON file layer
//! - daily or hourly file rotation
//! - macros that keep field names identical across every write path
//!
//! # Example
//!
//! ```no_run
//! use hubtrack::logging::init_logging;
//! use hubtrack::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(challan_no = "C-100", "Board loaded");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the outcome of a single-shipment stage transition
///
/// # Example
///
/// ```no_run
/// use hubtrack::log_transition;
/// use hubtrack::domain::{Stage, TransitRecordId};
///
/// log_transition!(TransitRecordId(7), Stage::DeliveredAtHub, "hub-clerk", "applied");
/// ```
#[macro_export]
macro_rules! log_transition {
    ($record_id:expr, $stage:expr, $actor:expr, $outcome:expr) => {
        tracing::info!(
            record_id = %$record_id,
            stage = %$stage,
            actor = %$actor,
            outcome = $outcome,
            "Stage transition"
        );
    };
}

/// Log a charge ledger upsert
///
/// `$carrier` is an `Option` and is recorded with `Debug` formatting.
#[macro_export]
macro_rules! log_kaat_upsert {
    ($gr_no:expr, $carrier:expr, $actor:expr) => {
        tracing::info!(
            gr_no = %$gr_no,
            carrier_id = ?$carrier,
            actor = %$actor,
            "Kaat row upserted"
        );
    };
}

/// Log the summary of a bulk operation
///
/// # Example
///
/// ```no_run
/// use hubtrack::log_bulk_summary;
///
/// log_bulk_summary!("apply_rates", 12, 9, 2, 1);
/// ```
#[macro_export]
macro_rules! log_bulk_summary {
    ($operation:expr, $total:expr, $applied:expr, $skipped:expr, $failed:expr) => {
        tracing::info!(
            operation = $operation,
            total = $total,
            applied = $applied,
            skipped = $skipped,
            failed = $failed,
            "Bulk operation finished"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::{GrNumber, Stage, TransitRecordId, TransportId};

    #[test]
    fn test_macros_expand_without_subscriber() {
        let gr = GrNumber::new("G1").unwrap();
        crate::log_transition!(TransitRecordId(1), Stage::DeliveredAtHub, "clerk", "applied");
        crate::log_kaat_upsert!(gr, Some(TransportId(3)), "clerk");
        crate::log_bulk_summary!("auto_assign", 3usize, 2usize, 1usize, 0usize);
    }
}
