//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, HubTrackConfig};
use crate::config::secret_string;
use crate::domain::errors::HubError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HubTrackConfig
/// 4. Applies environment variable overrides (HUBTRACK_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use hubtrack::config::loader::load_config;
///
/// let config = load_config("hubtrack.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<HubTrackConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HubError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HubError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text with the same steps as [`load_config`]
///
/// # Errors
///
/// See [`load_config`].
pub fn parse_config(contents: &str) -> Result<HubTrackConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: HubTrackConfig = toml::from_str(&contents)
        .map_err(|e| HubError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        HubError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| HubError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HubError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_env<T: std::str::FromStr>(name: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| HubError::Configuration(format!("Invalid value '{val}' for {name}")))
}

/// Applies environment variable overrides using the HUBTRACK_* prefix
///
/// Variables follow the pattern `HUBTRACK_<SECTION>_<KEY>`, for example
/// `HUBTRACK_RATES_TIEBREAK` or `HUBTRACK_BULK_MAX_SELECTION`.
fn apply_env_overrides(config: &mut HubTrackConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("HUBTRACK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("HUBTRACK_APPLICATION_ACTOR") {
        config.application.actor = val;
    }

    if let Ok(val) = std::env::var("HUBTRACK_DATABASE_TARGET") {
        config.database_target = match val.trim().to_lowercase().as_str() {
            "postgresql" => DatabaseTarget::PostgreSQL,
            "memory" => DatabaseTarget::Memory,
            other => {
                return Err(HubError::Configuration(format!(
                    "Invalid HUBTRACK_DATABASE_TARGET '{other}'. Must be one of: postgresql, memory"
                )))
            }
        };
    }

    // PostgreSQL overrides (only if PostgreSQL is configured)
    if let Some(ref mut pg_config) = config.postgresql {
        if let Ok(val) = std::env::var("HUBTRACK_POSTGRESQL_CONNECTION_STRING") {
            pg_config.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("HUBTRACK_POSTGRESQL_MAX_CONNECTIONS") {
            pg_config.max_connections = parse_env("HUBTRACK_POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Ok(val) = std::env::var("HUBTRACK_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS") {
            pg_config.statement_timeout_seconds =
                parse_env("HUBTRACK_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS", &val)?;
        }
    }

    if let Ok(val) = std::env::var("HUBTRACK_MEMORY_SEED_PATH") {
        config.memory.get_or_insert_with(Default::default).seed_path = Some(val);
    }

    // Rate overrides
    if let Ok(val) = std::env::var("HUBTRACK_RATES_TIEBREAK") {
        config.rates.tiebreak = val.parse().map_err(HubError::Configuration)?;
    }
    if let Ok(val) = std::env::var("HUBTRACK_RATES_KAAT_DECIMAL_PLACES") {
        config.rates.kaat_decimal_places = parse_env("HUBTRACK_RATES_KAAT_DECIMAL_PLACES", &val)?;
    }

    if let Ok(val) = std::env::var("HUBTRACK_BULK_MAX_SELECTION") {
        config.bulk.max_selection = parse_env("HUBTRACK_BULK_MAX_SELECTION", &val)?;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("HUBTRACK_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_env("HUBTRACK_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Ok(val) = std::env::var("HUBTRACK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("HUBTRACK_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
