//! Charge ledger (kaat) records
//!
//! One [`KaatRecord`] exists per GR number. Writes go through [`KaatPatch`]
//! upserts keyed by the GR number, so a second write for the same shipment
//! updates the existing row instead of adding one.

use crate::domain::ids::{GrNumber, HubRateId, TransportId};
use crate::domain::reference::AncillaryCharges;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Receipt identification of a kaat record
///
/// A record is identified by either a pohonch (delivery receipt) number or a
/// bilty number, never both. The enum makes the exclusivity structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "number")]
pub enum DocumentRef {
    Pohonch(String),
    Bilty(String),
}

impl DocumentRef {
    /// Builds the reference from the two storage columns
    ///
    /// Empty strings count as absent. Both columns being non-empty is a
    /// corrupt row.
    pub fn from_columns(
        pohonch_no: Option<String>,
        bilty_number: Option<String>,
    ) -> Result<Option<Self>, String> {
        let pohonch_no = pohonch_no.filter(|s| !s.trim().is_empty());
        let bilty_number = bilty_number.filter(|s| !s.trim().is_empty());

        match (pohonch_no, bilty_number) {
            (Some(p), Some(b)) => Err(format!(
                "pohonch_no '{p}' and bilty_number '{b}' are both set"
            )),
            (Some(p), None) => Ok(Some(DocumentRef::Pohonch(p))),
            (None, Some(b)) => Ok(Some(DocumentRef::Bilty(b))),
            (None, None) => Ok(None),
        }
    }

    /// Splits back into (pohonch_no, bilty_number) columns
    pub fn to_columns(doc: Option<&DocumentRef>) -> (Option<String>, Option<String>) {
        match doc {
            Some(DocumentRef::Pohonch(p)) => (Some(p.clone()), None),
            Some(DocumentRef::Bilty(b)) => (None, Some(b.clone())),
            None => (None, None),
        }
    }
}

/// Charge ledger entry for one GR number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KaatRecord {
    pub gr_no: GrNumber,

    #[serde(default)]
    pub document: Option<DocumentRef>,

    /// Chosen carrier
    #[serde(default)]
    pub transport_id: Option<TransportId>,

    /// Rate rule resolved for the carrier
    #[serde(default)]
    pub hub_rate_id: Option<HubRateId>,

    /// Computed or manually entered kaat amount
    #[serde(default)]
    pub kaat: Option<Decimal>,

    #[serde(flatten)]
    pub charges: AncillaryCharges,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl KaatRecord {
    /// Creates a row from its first patch
    pub fn create(gr_no: GrNumber, patch: &KaatPatch, actor: &str, at: DateTime<Utc>) -> Self {
        let mut record = Self {
            gr_no,
            document: None,
            transport_id: None,
            hub_rate_id: None,
            kaat: None,
            charges: AncillaryCharges::default(),
            created_by: actor.to_string(),
            created_at: at,
            updated_by: None,
            updated_at: None,
        };
        record.merge(patch);
        record
    }

    /// Applies a later patch, touching only the update audit fields
    pub fn update(&mut self, patch: &KaatPatch, actor: &str, at: DateTime<Utc>) {
        self.merge(patch);
        self.updated_by = Some(actor.to_string());
        self.updated_at = Some(at);
    }

    /// Whether a carrier has been assigned
    pub fn has_carrier(&self) -> bool {
        self.transport_id.is_some()
    }

    fn merge(&mut self, patch: &KaatPatch) {
        if let Some(doc) = &patch.document {
            self.document = Some(doc.clone());
        }
        if let Some(transport_id) = patch.transport_id {
            self.transport_id = Some(transport_id);
        }
        if let Some(hub_rate_id) = patch.hub_rate_id {
            self.hub_rate_id = hub_rate_id;
        }
        if let Some(kaat) = patch.kaat {
            self.kaat = Some(kaat);
        }
        if let Some(charges) = patch.charges {
            self.charges = charges;
        }
    }
}

/// Field group of a kaat record that one write claims
///
/// The carrier group covers the resolved rule and the ancillary charges,
/// since both follow from the carrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerField {
    Carrier,
    Kaat,
    Document,
}

impl fmt::Display for LedgerField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LedgerField::Carrier => "carrier",
            LedgerField::Kaat => "kaat",
            LedgerField::Document => "document",
        };
        f.write_str(name)
    }
}

/// Partial write to a kaat record; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KaatPatch {
    /// Replaces the document reference (and clears the other column)
    pub document: Option<DocumentRef>,

    pub transport_id: Option<TransportId>,

    /// `Some(None)` clears a previously resolved rule
    pub hub_rate_id: Option<Option<HubRateId>>,

    pub kaat: Option<Decimal>,

    pub charges: Option<AncillaryCharges>,
}

impl KaatPatch {
    /// Creates an empty patch
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document reference
    pub fn document(mut self, doc: DocumentRef) -> Self {
        self.document = Some(doc);
        self
    }

    /// Sets the carrier
    pub fn transport(mut self, transport_id: TransportId) -> Self {
        self.transport_id = Some(transport_id);
        self
    }

    /// Sets or clears the resolved rate rule
    pub fn hub_rate(mut self, hub_rate_id: Option<HubRateId>) -> Self {
        self.hub_rate_id = Some(hub_rate_id);
        self
    }

    /// Sets the kaat amount
    pub fn kaat(mut self, amount: Decimal) -> Self {
        self.kaat = Some(amount);
        self
    }

    /// Sets all four ancillary charges
    pub fn charges(mut self, charges: AncillaryCharges) -> Self {
        self.charges = Some(charges);
        self
    }

    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        self == &KaatPatch::default()
    }

    /// Field groups this patch writes
    pub fn fields(&self) -> Vec<LedgerField> {
        let mut fields = Vec::new();
        if self.transport_id.is_some() || self.hub_rate_id.is_some() || self.charges.is_some() {
            fields.push(LedgerField::Carrier);
        }
        if self.kaat.is_some() {
            fields.push(LedgerField::Kaat);
        }
        if self.document.is_some() {
            fields.push(LedgerField::Document);
        }
        fields
    }
}
