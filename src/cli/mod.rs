//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for hubtrack using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// hubtrack - hub transit tracking and rate application
#[derive(Parser, Debug)]
#[command(name = "hubtrack")]
#[command(version, about, long_about = None)]
#[command(author = "Hubtrack Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "hubtrack.toml", env = "HUBTRACK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "HUBTRACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Acting user recorded on writes (defaults to application.actor)
    #[arg(long, global = true, env = "HUBTRACK_ACTOR")]
    pub actor: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the transit board of a challan
    Board(commands::board::BoardArgs),

    /// Mark a challan as received at the hub
    Receive(commands::transit::ReceiveArgs),

    /// Move one shipment to a delivery stage
    Transition(commands::transit::TransitionArgs),

    /// Move many shipments to the same stage in one store write
    BulkTransition(commands::transit::BulkTransitionArgs),

    /// Replace or clear the remarks of a shipment
    Remarks(commands::transit::RemarksArgs),

    /// Show the stage history of a shipment
    History(commands::transit::HistoryArgs),

    /// Assign a carrier to a shipment
    SetCarrier(commands::kaat::SetCarrierArgs),

    /// Record the pohonch or bilty number of a shipment
    SetDocument(commands::kaat::SetDocumentArgs),

    /// Assign carriers where exactly one serves the destination
    AutoAssign(commands::kaat::AutoAssignArgs),

    /// Compute kaat from hub rates for a challan
    ApplyRates(commands::kaat::ApplyRatesArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
