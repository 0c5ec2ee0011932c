//! Charge ledger (kaat) service
//!
//! Carrier assignment and pricing are separate actions. Assigning a carrier
//! re-resolves the hub rate and copies its ancillary charges, but never
//! computes the kaat amount; [`KaatLedger::apply_rate`] does that.

use crate::adapters::database::traits::KaatStore;
use crate::core::rates::{compute_charge, round_kaat, RateResolver};
use crate::core::transit::LedgerBusySet;
use crate::domain::ids::{GrNumber, TransportId};
use crate::domain::{
    AncillaryCharges, DocumentRef, HubError, HubRate, KaatRecord, Result, UnifiedShipment,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

pub use crate::domain::KaatPatch;

/// Outcome of pricing one shipment
#[derive(Debug, Clone, PartialEq)]
pub enum RateApplication {
    /// Kaat computed and written
    Applied(KaatRecord),

    /// Stored values already match the computed ones; nothing written
    Unchanged(KaatRecord),

    /// No carrier assigned yet
    NoCarrier,

    /// No rate configured for the carrier and destination
    NoRate { carrier: TransportId },
}

/// Upserts and pricing over a [`KaatStore`]
pub struct KaatLedger {
    store: Arc<dyn KaatStore + Send + Sync>,
    resolver: Arc<RateResolver>,
    decimal_places: u32,
    busy: LedgerBusySet,
}

impl KaatLedger {
    /// Create a ledger; kaat amounts are rounded to `decimal_places` on write
    pub fn new(
        store: Arc<dyn KaatStore + Send + Sync>,
        resolver: Arc<RateResolver>,
        decimal_places: u32,
    ) -> Self {
        Self {
            store,
            resolver,
            decimal_places,
            busy: LedgerBusySet::new(),
        }
    }

    /// (GR number, field) pairs with a write in flight
    pub fn busy(&self) -> &LedgerBusySet {
        &self.busy
    }

    /// The resolver used for carrier and rate lookups
    pub fn resolver(&self) -> &Arc<RateResolver> {
        &self.resolver
    }

    /// Ledger row for one shipment
    pub async fn get(&self, gr_no: &GrNumber) -> Result<Option<KaatRecord>> {
        self.store.get_kaat(gr_no).await
    }

    /// Ledger rows for a set of shipments, keyed by GR number
    pub async fn for_shipments(&self, gr_nos: &[GrNumber]) -> Result<HashMap<GrNumber, KaatRecord>> {
        let rows = self.store.list_kaat(gr_nos).await?;
        Ok(rows.into_iter().map(|r| (r.gr_no.clone(), r)).collect())
    }

    /// Insert or update the row for a GR number
    ///
    /// Manually entered amounts go through here as well. The kaat amount is
    /// rounded before it reaches the store. The fields the patch writes stay
    /// claimed until the store answers, success or not.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative amounts or an empty document
    /// number, [`HubError::LedgerBusy`] while another write to one of the
    /// same fields is in flight, otherwise whatever the store reports.
    pub async fn upsert(&self, gr_no: &GrNumber, patch: KaatPatch, actor: &str) -> Result<KaatRecord> {
        let patch = self.normalize(patch)?;
        let keys = patch.fields().into_iter().map(|f| (gr_no.clone(), f)).collect();
        let _claim = self
            .busy
            .claim_all(keys)
            .map_err(|(gr_no, field)| HubError::LedgerBusy { gr_no, field })?;

        let record = self.store.upsert_kaat(gr_no, &patch, actor, Utc::now()).await?;
        crate::log_kaat_upsert!(gr_no, record.transport_id, actor);
        Ok(record)
    }

    /// Assign a carrier and copy its rule's ancillary charges
    ///
    /// Without a matching rule the carrier is still assigned, and the
    /// resolved rule and the charges are cleared. The kaat amount is never
    /// touched here.
    pub async fn assign_carrier(
        &self,
        shipment: &UnifiedShipment,
        carrier: TransportId,
        actor: &str,
    ) -> Result<KaatRecord> {
        let rate = self.resolve_for(shipment, carrier).await?;

        let charges = match &rate {
            Some(rate) => rate.charges,
            None => {
                tracing::warn!(
                    gr_no = %shipment.gr_no(),
                    carrier_id = %carrier,
                    "Carrier assigned without a configured hub rate"
                );
                AncillaryCharges::default()
            }
        };
        let patch = KaatPatch::new()
            .transport(carrier)
            .hub_rate(rate.as_ref().map(|r| r.id))
            .charges(charges);

        self.upsert(shipment.gr_no(), patch, actor).await
    }

    /// Compute and store the kaat for a shipment with an assigned carrier
    ///
    /// `existing` is the shipment's current ledger row, if any.
    pub async fn apply_rate(
        &self,
        shipment: &UnifiedShipment,
        existing: Option<&KaatRecord>,
        actor: &str,
    ) -> Result<RateApplication> {
        let Some(carrier) = existing.and_then(|r| r.transport_id) else {
            return Ok(RateApplication::NoCarrier);
        };

        let Some(rate) = self.resolve_for(shipment, carrier).await? else {
            return Ok(RateApplication::NoRate { carrier });
        };

        let amount = round_kaat(compute_charge(shipment, &rate), self.decimal_places);

        if let Some(current) = existing {
            if current.kaat == Some(amount)
                && current.hub_rate_id == Some(rate.id)
                && current.charges == rate.charges
            {
                return Ok(RateApplication::Unchanged(current.clone()));
            }
        }

        let patch = KaatPatch::new()
            .kaat(amount)
            .hub_rate(Some(rate.id))
            .charges(rate.charges);
        let record = self.upsert(shipment.gr_no(), patch, actor).await?;

        tracing::debug!(
            gr_no = %shipment.gr_no(),
            hub_rate_id = %rate.id,
            kaat = %amount,
            "Hub rate applied"
        );
        Ok(RateApplication::Applied(record))
    }

    /// [`Self::apply_rate`] after loading the current row
    pub async fn apply_rate_for(&self, shipment: &UnifiedShipment, actor: &str) -> Result<RateApplication> {
        let existing = self.get(shipment.gr_no()).await?;
        self.apply_rate(shipment, existing.as_ref(), actor).await
    }

    /// Set the pohonch or bilty number, clearing the other
    pub async fn set_document(&self, gr_no: &GrNumber, document: DocumentRef, actor: &str) -> Result<KaatRecord> {
        self.upsert(gr_no, KaatPatch::new().document(document), actor).await
    }

    async fn resolve_for(&self, shipment: &UnifiedShipment, carrier: TransportId) -> Result<Option<HubRate>> {
        match shipment.destination_city_id() {
            Some(city) => {
                self.resolver
                    .resolve_for_goods(carrier, city, shipment.contents.as_deref())
                    .await
            }
            None => Ok(None),
        }
    }

    fn normalize(&self, mut patch: KaatPatch) -> Result<KaatPatch> {
        if let Some(doc) = &mut patch.document {
            let number = match doc {
                DocumentRef::Pohonch(n) | DocumentRef::Bilty(n) => n,
            };
            *number = number.trim().to_string();
            if number.is_empty() {
                return Err(HubError::Validation(
                    "document number cannot be empty".to_string(),
                ));
            }
        }

        if let Some(kaat) = patch.kaat {
            if kaat < Decimal::ZERO {
                return Err(HubError::Validation(format!("kaat cannot be negative: {kaat}")));
            }
            patch.kaat = Some(round_kaat(kaat, self.decimal_places));
        }

        if let Some(charges) = &patch.charges {
            check_charges(charges)?;
        }

        Ok(patch)
    }
}

fn check_charges(charges: &AncillaryCharges) -> Result<()> {
    let fields = [
        ("dd_chrg", charges.dd_chrg),
        ("ewb_chrg", charges.ewb_chrg),
        ("labour_chrg", charges.labour_chrg),
        ("other_chrg", charges.other_chrg),
    ];
    match fields.iter().find(|(_, v)| *v < Decimal::ZERO) {
        Some((name, value)) => Err(HubError::Validation(format!(
            "{name} cannot be negative: {value}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemorySeed, MemoryStore};
    use crate::core::rates::{RateTiebreak, ReferenceCache};
    use crate::domain::ids::{ChallanNumber, CityId, HubRateId, TransitRecordId};
    use crate::domain::{City, LedgerField, PricingMode, TransitRecord, Transport};
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn gr(s: &str) -> GrNumber {
        GrNumber::from_str(s).unwrap()
    }

    fn seed() -> MemorySeed {
        MemorySeed {
            cities: vec![City {
                id: CityId(1),
                name: "Kanpur".into(),
                code: "KNP".into(),
            }],
            transports: vec![Transport {
                id: TransportId(5),
                name: "X-Transport".into(),
                city_id: Some(CityId(1)),
                mobile: None,
                address: None,
            }],
            hub_rates: vec![HubRate {
                id: HubRateId(9),
                transport_id: TransportId(5),
                destination_city_id: CityId(1),
                goods_type: None,
                pricing_mode: PricingMode::PerKg,
                rate_per_kg: Some(dec!(5)),
                rate_per_pkg: None,
                min_charge: Some(dec!(20)),
                charges: AncillaryCharges {
                    dd_chrg: dec!(15),
                    ..Default::default()
                },
                is_active: true,
                updated_at: None,
            }],
            ..Default::default()
        }
    }

    fn ledger(store: Arc<MemoryStore>) -> KaatLedger {
        let cache = Arc::new(ReferenceCache::new(store.clone()));
        let resolver = Arc::new(RateResolver::new(cache, RateTiebreak::default()));
        KaatLedger::new(store, resolver, 2)
    }

    fn shipment(weight: Decimal) -> UnifiedShipment {
        let record = TransitRecord::new(
            TransitRecordId(1),
            ChallanNumber::from_str("C-100").unwrap(),
            gr("G1"),
        );
        let mut view = UnifiedShipment::placeholder(record);
        view.destination_city = Some(City {
            id: CityId(1),
            name: "Kanpur".into(),
            code: "KNP".into(),
        });
        view.weight = Some(weight);
        view
    }

    #[tokio::test]
    async fn test_assign_copies_charges_without_kaat() {
        let store = Arc::new(MemoryStore::from_seed(seed()));
        let ledger = ledger(store);

        let record = ledger
            .assign_carrier(&shipment(dec!(2)), TransportId(5), "clerk")
            .await
            .unwrap();

        assert_eq!(record.transport_id, Some(TransportId(5)));
        assert_eq!(record.hub_rate_id, Some(HubRateId(9)));
        assert_eq!(record.charges.dd_chrg, dec!(15));
        assert!(record.kaat.is_none());
    }

    #[tokio::test]
    async fn test_apply_rate_clamps_and_is_idempotent() {
        let store = Arc::new(MemoryStore::from_seed(seed()));
        let ledger = ledger(store.clone());
        let view = shipment(dec!(2));

        assert_eq!(
            ledger.apply_rate_for(&view, "clerk").await.unwrap(),
            RateApplication::NoCarrier
        );

        ledger.assign_carrier(&view, TransportId(5), "clerk").await.unwrap();
        let applied = ledger.apply_rate_for(&view, "clerk").await.unwrap();
        match applied {
            RateApplication::Applied(record) => assert_eq!(record.kaat, Some(dec!(20))),
            other => panic!("expected Applied, got {other:?}"),
        }

        let again = ledger.apply_rate_for(&view, "clerk").await.unwrap();
        assert!(matches!(again, RateApplication::Unchanged(_)));
        assert_eq!(store.kaat_row_count().await, 1);
    }

    #[tokio::test]
    async fn test_no_rate_for_unknown_destination() {
        let store = Arc::new(MemoryStore::from_seed(seed()));
        let ledger = ledger(store);
        let mut view = shipment(dec!(2));
        view.destination_city = None;

        ledger.assign_carrier(&view, TransportId(5), "clerk").await.unwrap();
        assert_eq!(
            ledger.apply_rate_for(&view, "clerk").await.unwrap(),
            RateApplication::NoRate {
                carrier: TransportId(5)
            }
        );
    }

    #[tokio::test]
    async fn test_manual_kaat_is_rounded_and_validated() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store);

        let record = ledger
            .upsert(&gr("G7"), KaatPatch::new().kaat(dec!(10.456)), "clerk")
            .await
            .unwrap();
        assert_eq!(record.kaat, Some(dec!(10.46)));

        let err = ledger
            .upsert(&gr("G7"), KaatPatch::new().kaat(dec!(-1)), "clerk")
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_document_switches_kind() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger(store);
        let g = gr("G2");

        ledger
            .set_document(&g, DocumentRef::Pohonch(" P-1 ".into()), "clerk")
            .await
            .unwrap();
        let record = ledger
            .set_document(&g, DocumentRef::Bilty("B-7".into()), "clerk")
            .await
            .unwrap();
        assert_eq!(record.document, Some(DocumentRef::Bilty("B-7".into())));

        let err = ledger
            .set_document(&g, DocumentRef::Bilty("  ".into()), "clerk")
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_busy_field_blocks_only_that_field() {
        let store = Arc::new(MemoryStore::from_seed(seed()));
        let ledger = ledger(store.clone());
        let g = gr("G1");

        let held = ledger.busy().claim((g.clone(), LedgerField::Carrier)).unwrap();
        let err = ledger
            .assign_carrier(&shipment(dec!(2)), TransportId(5), "clerk")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HubError::LedgerBusy { field: LedgerField::Carrier, .. }
        ));
        assert_eq!(store.kaat_row_count().await, 0);

        ledger
            .set_document(&g, DocumentRef::Pohonch("P-1".into()), "clerk")
            .await
            .unwrap();

        drop(held);
        ledger
            .assign_carrier(&shipment(dec!(2)), TransportId(5), "clerk")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_upsert_releases_fields() {
        let store = Arc::new(MemoryStore::from_seed(seed()));
        let ledger = ledger(store.clone());

        store.fail_writes(true);
        assert!(ledger
            .upsert(&gr("G1"), KaatPatch::new().kaat(dec!(12)), "clerk")
            .await
            .is_err());
        assert!(ledger.busy().is_empty());

        store.fail_writes(false);
        let record = ledger
            .upsert(&gr("G1"), KaatPatch::new().kaat(dec!(12)), "clerk")
            .await
            .unwrap();
        assert_eq!(record.kaat, Some(dec!(12)));
    }
}
