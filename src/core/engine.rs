//! Engine wiring
//!
//! Builds every service over one set of stores so they share the reference
//! cache and the in-flight guard.

use crate::adapters::database::{create_stores, Stores};
use crate::config::HubTrackConfig;
use crate::core::assign::AutoAssigner;
use crate::core::bulk::BulkProcessor;
use crate::core::ledger::KaatLedger;
use crate::core::rates::{RateResolver, RateTiebreak, ReferenceCache};
use crate::core::reconcile::BoardLoader;
use crate::core::transit::{InFlightSet, TransitTracker};
use crate::domain::Result;
use std::sync::Arc;

/// Tunables taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub tiebreak: RateTiebreak,
    pub kaat_decimal_places: u32,
    pub max_selection: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tiebreak: RateTiebreak::default(),
            kaat_decimal_places: 2,
            max_selection: 500,
        }
    }
}

impl EngineSettings {
    /// Settings from a loaded configuration
    pub fn from_config(config: &HubTrackConfig) -> Self {
        Self {
            tiebreak: config.rates.tiebreak,
            kaat_decimal_places: config.rates.kaat_decimal_places,
            max_selection: config.bulk.max_selection,
        }
    }
}

/// All services of the transit engine
pub struct HubEngine {
    pub stores: Stores,
    pub reference: Arc<ReferenceCache>,
    pub resolver: Arc<RateResolver>,
    pub ledger: Arc<KaatLedger>,
    pub tracker: Arc<TransitTracker>,
    pub bulk: Arc<BulkProcessor>,
    pub assigner: Arc<AutoAssigner>,
    pub boards: Arc<BoardLoader>,
}

impl HubEngine {
    /// Create the stores from configuration and wire the engine over them
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be created or its schema
    /// cannot be ensured.
    pub async fn connect(config: &HubTrackConfig) -> Result<Self> {
        let stores = create_stores(config).await?;
        stores.backend.ensure_schema().await?;
        tracing::info!(backend = stores.backend.backend_name(), "Store ready");
        Ok(Self::new(stores, EngineSettings::from_config(config)))
    }

    /// Wire the engine over existing stores
    pub fn new(stores: Stores, settings: EngineSettings) -> Self {
        let reference = Arc::new(ReferenceCache::new(stores.reference.clone()));
        let resolver = Arc::new(RateResolver::new(reference.clone(), settings.tiebreak));
        let ledger = Arc::new(KaatLedger::new(
            stores.kaat.clone(),
            resolver.clone(),
            settings.kaat_decimal_places,
        ));

        let in_flight = Arc::new(InFlightSet::new());
        let tracker = Arc::new(TransitTracker::with_in_flight(
            stores.transit.clone(),
            in_flight.clone(),
        ));
        let bulk = Arc::new(BulkProcessor::new(
            stores.transit.clone(),
            ledger.clone(),
            in_flight,
            settings.max_selection,
        ));
        let assigner = Arc::new(AutoAssigner::new(ledger.clone()));
        let boards = Arc::new(BoardLoader::new(
            stores.transit.clone(),
            stores.shipments.clone(),
            stores.kaat.clone(),
            reference.clone(),
        ));

        Self {
            stores,
            reference,
            resolver,
            ledger,
            tracker,
            bulk,
            assigner,
            boards,
        }
    }
}
