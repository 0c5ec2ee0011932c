//! Read-through reference data cache
//!
//! Cities, branches, carriers and active hub rates are loaded from the
//! [`ReferenceStore`] on first use and shared as one immutable snapshot until
//! [`ReferenceCache::refresh`] drops it.

use crate::adapters::database::traits::ReferenceStore;
use crate::domain::ids::{BranchId, CityId, TransportId};
use crate::domain::{Branch, City, HubRate, Result, Transport};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Reference tables as loaded at one point in time
#[derive(Debug, Clone, Default)]
pub struct ReferenceSnapshot {
    pub cities: Vec<City>,
    pub branches: Vec<Branch>,
    pub transports: Vec<Transport>,

    /// Active hub rates in store order
    pub hub_rates: Vec<HubRate>,

    pub loaded_at: Option<DateTime<Utc>>,
}

impl ReferenceSnapshot {
    /// Look up a city by id
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    /// Look up a carrier by id
    pub fn transport(&self, id: TransportId) -> Option<&Transport> {
        self.transports.iter().find(|t| t.id == id)
    }

    /// Look up a carrier by exact name, ignoring case
    pub fn transport_by_name(&self, name: &str) -> Option<&Transport> {
        let name = name.trim();
        self.transports
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Branch id to name map for the reconciler
    pub fn branch_names(&self) -> HashMap<BranchId, String> {
        self.branches
            .iter()
            .map(|b| (b.id, b.name.clone()))
            .collect()
    }

    /// Eligible carriers per destination city, in store order
    pub fn carriers_by_city(&self) -> HashMap<CityId, Vec<TransportId>> {
        let mut map: HashMap<CityId, Vec<TransportId>> = HashMap::new();
        for transport in &self.transports {
            if let Some(city_id) = transport.city_id {
                map.entry(city_id).or_default().push(transport.id);
            }
        }
        map
    }
}

/// Lazily loaded, explicitly refreshed reference snapshot
pub struct ReferenceCache {
    store: Arc<dyn ReferenceStore + Send + Sync>,
    snapshot: RwLock<Option<Arc<ReferenceSnapshot>>>,
}

impl ReferenceCache {
    /// Create an empty cache over a store
    pub fn new(store: Arc<dyn ReferenceStore + Send + Sync>) -> Self {
        Self {
            store,
            snapshot: RwLock::new(None),
        }
    }

    /// Current snapshot, loading it on first use
    ///
    /// # Errors
    ///
    /// Returns an error if any reference table cannot be read. A failed load
    /// leaves the cache empty so the next call retries.
    pub async fn snapshot(&self) -> Result<Arc<ReferenceSnapshot>> {
        if let Some(snapshot) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.snapshot.write().await;
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let snapshot = Arc::new(self.load().await?);
        tracing::info!(
            cities = snapshot.cities.len(),
            transports = snapshot.transports.len(),
            hub_rates = snapshot.hub_rates.len(),
            "Reference data loaded"
        );
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Drop the snapshot so the next lookup re-reads the store
    pub async fn refresh(&self) {
        *self.snapshot.write().await = None;
        tracing::debug!("Reference cache cleared");
    }

    /// Whether a snapshot is currently held
    pub async fn is_loaded(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    async fn load(&self) -> Result<ReferenceSnapshot> {
        Ok(ReferenceSnapshot {
            cities: self.store.list_cities().await?,
            branches: self.store.list_branches().await?,
            transports: self.store.list_transports().await?,
            hub_rates: self.store.list_active_hub_rates().await?,
            loaded_at: Some(Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(id: i64, city: Option<i64>) -> Transport {
        Transport {
            id: TransportId(id),
            name: format!("T-{id}"),
            city_id: city.map(CityId),
            mobile: None,
            address: None,
        }
    }

    #[test]
    fn test_carriers_by_city_groups_in_order() {
        let snapshot = ReferenceSnapshot {
            transports: vec![
                transport(1, Some(10)),
                transport(2, Some(20)),
                transport(3, Some(10)),
                transport(4, None),
            ],
            ..Default::default()
        };

        let map = snapshot.carriers_by_city();
        assert_eq!(map[&CityId(10)], vec![TransportId(1), TransportId(3)]);
        assert_eq!(map[&CityId(20)], vec![TransportId(2)]);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_transport_by_name_ignores_case() {
        let snapshot = ReferenceSnapshot {
            transports: vec![transport(7, None)],
            ..Default::default()
        };
        assert_eq!(
            snapshot.transport_by_name(" t-7 ").map(|t| t.id),
            Some(TransportId(7))
        );
    }
}
