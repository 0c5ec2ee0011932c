// hubtrack - Hub transit tracking engine
// Copyright (c) 2025 Hubtrack Contributors
// Licensed under the MIT License

//! # hubtrack - Hub transit tracking and rate application
//!
//! hubtrack is the back-office engine of a freight hub. Shipments arrive on
//! challans (loading manifests), move through a fixed chain of delivery
//! stages, and are billed onward by an assigned carrier at a hub rate.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Reconciling** each transit record with its bilty or station bilty
//! - **Tracking** delivery stages with backfill on terminal transitions
//! - **Bulk transitions** applied as one all-or-nothing store write
//! - **Pricing** shipments from hub rates into the charge ledger (kaat)
//!
//! ## Architecture
//!
//! hubtrack follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (transit, reconcile, rates, ledger, bulk)
//! - [`adapters`] - Store backends (PostgreSQL, in-memory)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hubtrack::config::load_config;
//! use hubtrack::core::engine::HubEngine;
//! use hubtrack::domain::ChallanNumber;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("hubtrack.toml")?;
//!     let engine = HubEngine::connect(&config).await?;
//!
//!     let board = engine.boards.load(&ChallanNumber::new("C-100")?).await?;
//!     for shipment in &board.shipments {
//!         println!("{} {}", shipment.gr_no(), shipment.display_status());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Stage transitions
//!
//! Marking a terminal stage also sets every earlier stage that is still
//! unset, stamped with the same timestamp:
//!
//! ```rust,no_run
//! use hubtrack::core::engine::HubEngine;
//! use hubtrack::core::transit::TransitionRequest;
//! use hubtrack::domain::{Stage, TransitRecordId};
//!
//! # async fn example(engine: &HubEngine) -> Result<(), Box<dyn std::error::Error>> {
//! let request = TransitionRequest::confirmed(Stage::DeliveredAtDestination, "hub-clerk");
//! let (record, outcome) = engine
//!     .tracker
//!     .transition_by_id(TransitRecordId(7), request)
//!     .await?;
//! println!("{} -> {} ({})", record.gr_no, record.display_status(), outcome.is_applied());
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`domain::Result`], whose error type is
//! [`domain::HubError`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
