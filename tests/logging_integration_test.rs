//! Integration tests for logging functionality

use hubtrack::config::LoggingConfig;
use hubtrack::domain::{GrNumber, Stage, TransitRecordId, TransportId};
use hubtrack::logging::init_logging;
use std::str::FromStr;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_path, "/var/log/hubtrack");
    assert_eq!(config.local_rotation, "daily");
}

// One test installs the global subscriber; a second install in the same
// process must fail instead of replacing it.
#[test]
fn test_init_creates_log_directory_once() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "hourly".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.is_dir());

    hubtrack::log_transition!(TransitRecordId(7), Stage::OutFromHub, "clerk", "applied");
    hubtrack::log_kaat_upsert!(
        GrNumber::from_str("G7").unwrap(),
        Some(TransportId(5)),
        "clerk"
    );
    hubtrack::log_bulk_summary!("delivered", 3, 2, 1, 0);

    let second = init_logging("info", &config);
    assert!(second.is_err());
    drop(guard);
}

#[test]
fn test_invalid_level_is_rejected_before_install() {
    let config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    assert!(init_logging("verbose", &config).is_err());
}
