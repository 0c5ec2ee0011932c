//! Core business logic for hubtrack.
//!
//! # Modules
//!
//! - [`reconcile`] - Unified shipment view over the two source tables, and the transit board
//! - [`transit`] - Delivery-stage state machine, in-flight guard, stage history
//! - [`rates`] - Reference cache, hub rate resolution, kaat computation
//! - [`ledger`] - Charge ledger upserts, carrier assignment, rate application
//! - [`bulk`] - Bulk status transitions and bulk rate application
//! - [`assign`] - Carrier auto-assignment
//! - [`engine`] - Wiring of all services over one set of stores
//!
//! # Workflow
//!
//! 1. **Load**: the board loader pre-fetches a challan's records, source rows,
//!    reference data and ledger rows, and reconciles them
//! 2. **Track**: the tracker (or the bulk processor) moves shipments through
//!    their stages
//! 3. **Assign**: carriers are picked manually or by auto-assignment
//! 4. **Price**: hub rates are applied to shipments with a carrier
//!
//! # Example
//!
//! ```rust,no_run
//! use hubtrack::config::load_config;
//! use hubtrack::core::engine::HubEngine;
//! use hubtrack::domain::ChallanNumber;
//! use std::str::FromStr;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("hubtrack.toml")?;
//! let engine = HubEngine::connect(&config).await?;
//!
//! let board = engine.boards.load(&ChallanNumber::from_str("C-100")?).await?;
//! let summary = engine.assigner.run(&board.shipments, "hub-clerk").await?;
//! println!("Assigned: {}", summary.assigned);
//!
//! let rates = engine.bulk.apply_rates(&board.shipments, "hub-clerk").await?;
//! println!("Priced: {}", rates.applied);
//! # Ok(())
//! # }
//! ```

pub mod assign;
pub mod bulk;
pub mod engine;
pub mod ledger;
pub mod rates;
pub mod reconcile;
pub mod transit;
