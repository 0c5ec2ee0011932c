//! Hub rate resolution
//!
//! A missing rate is a valid business state, so every lookup returns
//! `Option<HubRate>`; callers decide how to surface "no rate configured".

use crate::core::rates::cache::{ReferenceCache, ReferenceSnapshot};
use crate::domain::ids::{CityId, TransportId};
use crate::domain::{HubRate, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Choice among several active rules for the same (carrier, city) key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTiebreak {
    /// Latest `updated_at`, then highest id
    #[default]
    MostRecentlyUpdated,

    /// First row in store order
    StoreOrder,
}

impl fmt::Display for RateTiebreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RateTiebreak::MostRecentlyUpdated => "most_recently_updated",
            RateTiebreak::StoreOrder => "store_order",
        })
    }
}

impl FromStr for RateTiebreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "most_recently_updated" => Ok(RateTiebreak::MostRecentlyUpdated),
            "store_order" => Ok(RateTiebreak::StoreOrder),
            other => Err(format!(
                "Invalid tiebreak '{other}'. Must be one of: most_recently_updated, store_order"
            )),
        }
    }
}

/// Picks one rule among candidates
pub fn select_rate<'a, I>(candidates: I, tiebreak: RateTiebreak) -> Option<&'a HubRate>
where
    I: IntoIterator<Item = &'a HubRate>,
{
    let mut candidates = candidates.into_iter().filter(|r| r.is_active);
    match tiebreak {
        RateTiebreak::StoreOrder => candidates.next(),
        RateTiebreak::MostRecentlyUpdated => {
            candidates.max_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)))
        }
    }
}

/// Rule for (carrier, city) in a snapshot
pub fn resolve_in(
    snapshot: &ReferenceSnapshot,
    carrier: TransportId,
    city: CityId,
    tiebreak: RateTiebreak,
) -> Option<&HubRate> {
    select_rate(
        snapshot.hub_rates.iter().filter(|r| r.matches(carrier, city)),
        tiebreak,
    )
}

/// Goods-aware rule for (carrier, city) in a snapshot
///
/// Order of preference: a rule for exactly these goods, a generic rule with
/// no goods type, then any rule for the key.
pub fn resolve_for_goods_in<'a>(
    snapshot: &'a ReferenceSnapshot,
    carrier: TransportId,
    city: CityId,
    goods: Option<&str>,
    tiebreak: RateTiebreak,
) -> Option<&'a HubRate> {
    let keyed: Vec<&HubRate> = snapshot
        .hub_rates
        .iter()
        .filter(|r| r.matches(carrier, city))
        .collect();

    let goods = goods.map(str::trim).filter(|g| !g.is_empty());
    if let Some(goods) = goods {
        let exact = keyed.iter().copied().filter(|r| {
            r.goods_type
                .as_deref()
                .is_some_and(|g| g.trim().eq_ignore_ascii_case(goods))
        });
        if let Some(rate) = select_rate(exact, tiebreak) {
            return Some(rate);
        }
    }

    let generic = keyed.iter().copied().filter(|r| r.goods_type.is_none());
    select_rate(generic, tiebreak).or_else(|| select_rate(keyed.iter().copied(), tiebreak))
}

/// Rate lookups over the reference cache
pub struct RateResolver {
    cache: Arc<ReferenceCache>,
    tiebreak: RateTiebreak,
}

impl RateResolver {
    /// Create a resolver
    pub fn new(cache: Arc<ReferenceCache>, tiebreak: RateTiebreak) -> Self {
        Self { cache, tiebreak }
    }

    /// The cache backing this resolver
    pub fn cache(&self) -> &Arc<ReferenceCache> {
        &self.cache
    }

    /// Configured tiebreak
    pub fn tiebreak(&self) -> RateTiebreak {
        self.tiebreak
    }

    /// First active rule for (carrier, city), or `None` if no rate is configured
    pub async fn resolve(&self, carrier: TransportId, city: CityId) -> Result<Option<HubRate>> {
        let snapshot = self.cache.snapshot().await?;
        let rate = resolve_in(&snapshot, carrier, city, self.tiebreak).cloned();
        if rate.is_none() {
            tracing::debug!(carrier_id = %carrier, city_id = %city, "No hub rate configured");
        }
        Ok(rate)
    }

    /// Like [`Self::resolve`], preferring a rule for the shipment's goods
    pub async fn resolve_for_goods(
        &self,
        carrier: TransportId,
        city: CityId,
        goods: Option<&str>,
    ) -> Result<Option<HubRate>> {
        let snapshot = self.cache.snapshot().await?;
        Ok(resolve_for_goods_in(&snapshot, carrier, city, goods, self.tiebreak).cloned())
    }

    /// Re-read rates on the next lookup
    pub async fn refresh(&self) {
        self.cache.refresh().await;
    }
}
