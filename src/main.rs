// hubtrack - Hub transit tracking engine
// Copyright (c) 2025 Hubtrack Contributors
// Licensed under the MIT License

use clap::Parser;
use hubtrack::cli::{Cli, Commands};
use hubtrack::config::{load_config, LoggingConfig};
use hubtrack::logging::init_logging;
use std::process;

fn console_only(cli: &Cli) -> (String, LoggingConfig) {
    let config = LoggingConfig {
        local_enabled: false,
        ..LoggingConfig::default()
    };
    (cli.log_level.clone().unwrap_or_else(|| "info".to_string()), config)
}

/// Log level and file settings from the config file, console-only if it
/// cannot be loaded
fn logging_settings(cli: &Cli) -> (String, LoggingConfig) {
    match &cli.command {
        // These must work without a valid config file
        Commands::Init(_) | Commands::ValidateConfig(_) => console_only(cli),
        _ => match load_config(&cli.config) {
            Ok(config) => (
                cli.log_level
                    .clone()
                    .unwrap_or_else(|| config.application.log_level.clone()),
                config.logging,
            ),
            Err(_) => console_only(cli),
        },
    }
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (log_level, logging_config) = logging_settings(&cli);
    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "hubtrack starting");

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // Flush buffered file logs before exiting
    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.config.as_str();
    let actor = cli.actor.as_deref();

    match &cli.command {
        Commands::Board(args) => args.execute(config, actor).await,
        Commands::Receive(args) => args.execute(config, actor).await,
        Commands::Transition(args) => args.execute(config, actor).await,
        Commands::BulkTransition(args) => args.execute(config, actor).await,
        Commands::Remarks(args) => args.execute(config, actor).await,
        Commands::History(args) => args.execute(config, actor).await,
        Commands::SetCarrier(args) => args.execute(config, actor).await,
        Commands::SetDocument(args) => args.execute(config, actor).await,
        Commands::AutoAssign(args) => args.execute(config, actor).await,
        Commands::ApplyRates(args) => args.execute(config, actor).await,
        Commands::ValidateConfig(args) => args.execute(config).await,
        Commands::Init(args) => args.execute().await,
    }
}
