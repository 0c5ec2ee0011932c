//! CLI command implementations
//!
//! Exit codes: 0 success, 1 partial failure, 2 configuration error,
//! 3 validation error or rejected write, 4 connection error, 5 fatal error.

pub mod board;
pub mod init;
pub mod kaat;
pub mod transit;
pub mod validate;

use crate::config::{load_config, HubTrackConfig};
use crate::core::engine::HubEngine;
use crate::domain::{HubError, StoreError, TransitionError};
use std::io::{self, Write};

/// Configuration, engine and acting user of one command run
pub struct Session {
    pub config: HubTrackConfig,
    pub engine: HubEngine,
    pub actor: String,
}

/// Load the configuration and connect the engine
///
/// On failure the message is printed and the exit code is returned.
pub async fn open_session(config_path: &str, actor: Option<&str>) -> Result<Session, i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            return Err(2);
        }
    };

    let engine = match HubEngine::connect(&config).await {
        Ok(engine) => engine,
        Err(e) => {
            println!("❌ Failed to open the store");
            println!("   Error: {e}");
            return Err(exit_code(&e));
        }
    };

    let actor = actor
        .map(str::to_string)
        .unwrap_or_else(|| config.application.actor.clone());

    Ok(Session {
        config,
        engine,
        actor,
    })
}

/// Exit code for an error returned by the engine
pub fn exit_code(err: &HubError) -> i32 {
    match err {
        HubError::Configuration(_) => 2,
        HubError::Validation(_) | HubError::NotFound(_) | HubError::BulkRejected(_) => 3,
        HubError::Transition(TransitionError::Busy { .. })
        | HubError::LedgerBusy { .. }
        | HubError::Transition(TransitionError::NotConfirmed(_)) => 3,
        HubError::Store(StoreError::ConnectionFailed(_)) => 4,
        _ => 5,
    }
}

/// Print an engine error and return its exit code
pub fn report_failure(action: &str, err: &HubError) -> i32 {
    tracing::error!(error = %err, action, "Command failed");
    println!("❌ {action} failed");
    println!("   Error: {err}");
    exit_code(err)
}

/// Ask `[y/N]` on stdin unless `assume_yes` is set
pub fn confirm(prompt: &str, assume_yes: bool) -> io::Result<bool> {
    if assume_yes {
        return Ok(true);
    }

    print!("{prompt} [y/N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
