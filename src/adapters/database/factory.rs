//! Store factory
//!
//! This module creates the configured backend and hands it out as the four
//! store trait objects the engine consumes.

use crate::adapters::database::traits::{
    HubStore, KaatStore, ReferenceStore, ShipmentStore, TransitStore,
};
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, HubTrackConfig};
use crate::domain::{HubError, Result};
use std::sync::Arc;

/// Every store view of one backend, sharing its connection pool
#[derive(Clone)]
pub struct Stores {
    pub reference: Arc<dyn ReferenceStore + Send + Sync>,
    pub shipments: Arc<dyn ShipmentStore + Send + Sync>,
    pub transit: Arc<dyn TransitStore + Send + Sync>,
    pub kaat: Arc<dyn KaatStore + Send + Sync>,
    pub backend: Arc<dyn HubStore + Send + Sync>,
}

impl Stores {
    /// Splits one backend into its store views
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: HubStore + Send + Sync + 'static,
    {
        Self {
            reference: backend.clone(),
            shipments: backend.clone(),
            transit: backend.clone(),
            kaat: backend.clone(),
            backend,
        }
    }
}

/// Create the stores selected by `database_target`
///
/// # Errors
///
/// Returns an error if the backend section is missing, the seed file cannot
/// be read, or the connection pool cannot be created.
pub async fn create_stores(config: &HubTrackConfig) -> Result<Stores> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                HubError::Configuration(
                    "database_target is 'postgresql' but [postgresql] section is missing"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL stores");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            let adapter = Arc::new(PostgreSQLAdapter::new(client));

            Ok(Stores::from_backend(adapter))
        }
        DatabaseTarget::Memory => {
            let store = match config.memory.as_ref().and_then(|m| m.seed_path.as_deref()) {
                Some(path) => {
                    tracing::info!(seed_path = %path, "Creating in-memory stores from seed");
                    MemoryStore::from_seed_file(path)?
                }
                None => {
                    tracing::info!("Creating empty in-memory stores");
                    MemoryStore::new()
                }
            };

            Ok(Stores::from_backend(Arc::new(store)))
        }
    }
}
