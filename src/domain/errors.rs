//! Domain error types
//!
//! The error hierarchy for hubtrack. Errors are domain-specific and don't
//! expose third-party types; driver and parser errors are flattened into
//! message-carrying variants at the adapter boundary.

use crate::domain::ids::{GrNumber, TransitRecordId};
use crate::domain::kaat::LedgerField;
use crate::domain::transit::Stage;
use thiserror::Error;

/// Main hubtrack error type
#[derive(Debug, Error)]
pub enum HubError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Persistent store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// State-machine transition errors
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Input or stored-data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Another write to the same ledger field of a shipment is still in flight
    #[error("Ledger {field} update already in progress for GR {gr_no}")]
    LedgerBusy { gr_no: GrNumber, field: LedgerField },

    /// Bulk status transition refused by the store
    #[error("Bulk transition rejected: {0}")]
    BulkRejected(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Store-specific errors
///
/// Raised by the store adapters. These never carry driver types.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Could not obtain a connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A read query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A write was rejected or failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// A stored row could not be mapped to a domain record
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Transition errors for a single shipment
#[derive(Debug, Error)]
pub enum TransitionError {
    /// Another write to the same (record, stage) pair is still in flight
    #[error("Transition to {stage} already in progress for record {record_id}")]
    Busy {
        record_id: TransitRecordId,
        stage: Stage,
    },

    /// The store rejected the write; nothing was changed locally
    #[error("Failed to mark {stage} for record {record_id}: {message}")]
    WriteFailed {
        record_id: TransitRecordId,
        stage: Stage,
        message: String,
    },

    /// The caller did not confirm the transition
    #[error("Transition to {0} was not confirmed")]
    NotConfirmed(Stage),
}

/// Per-row failure detail for batch operations
#[derive(Debug, Clone)]
pub struct RowFailure {
    /// GR number of the failed row
    pub gr_no: GrNumber,

    /// Error message
    pub message: String,
}

impl RowFailure {
    /// Creates a new row failure
    pub fn new(gr_no: GrNumber, message: impl Into<String>) -> Self {
        Self {
            gr_no,
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        HubError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for HubError {
    fn from(err: toml::de::Error) -> Self {
        HubError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_error_display() {
        let err = HubError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_store_error_conversion() {
        let store_err = StoreError::WriteFailed("unique violation".to_string());
        let err: HubError = store_err.into();
        assert!(matches!(err, HubError::Store(_)));
    }

    #[test]
    fn test_transition_error_mentions_stage() {
        let err = TransitionError::Busy {
            record_id: TransitRecordId(9),
            stage: Stage::DeliveredAtHub,
        };
        let msg = err.to_string();
        assert!(msg.contains("delivered_at_hub"));
        assert!(msg.contains('9'));
    }

    #[test]
    fn test_row_failure_builder() {
        let failure = RowFailure::new(GrNumber::new("G1").unwrap(), "boom");
        assert_eq!(failure.gr_no.as_str(), "G1");
        assert_eq!(failure.message, "boom");
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: HubError = json_err.into();
        assert!(matches!(err, HubError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("a = = b").unwrap_err();
        let err: HubError = toml_err.into();
        assert!(err.to_string().contains("TOML parse error"));
    }
}
