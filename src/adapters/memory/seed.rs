//! JSON seed snapshot for the in-memory store

use crate::core::transit::StageEvent;
use crate::domain::context::ResultExt;
use crate::domain::{
    Bilty, Branch, Challan, City, HubRate, KaatRecord, Result, StationBilty, TransitRecord,
    Transport,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of every table; all sections are optional in the file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySeed {
    pub cities: Vec<City>,
    pub branches: Vec<Branch>,
    pub transports: Vec<Transport>,
    pub hub_rates: Vec<HubRate>,
    pub bilties: Vec<Bilty>,
    pub station_bilties: Vec<StationBilty>,
    pub challans: Vec<Challan>,
    pub transit_records: Vec<TransitRecord>,
    pub kaat: Vec<KaatRecord>,
    pub stage_events: Vec<StageEvent>,
}

impl MemorySeed {
    /// Read a seed from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid seed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid seed file {}", path.display()))
    }

    /// Parse a seed from JSON text
    pub fn from_json(content: &str) -> Result<Self> {
        let seed: MemorySeed = serde_json::from_str(content)?;
        seed.check_unique_keys()?;
        Ok(seed)
    }

    /// Write the seed as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_unique_keys(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for row in &self.kaat {
            if !seen.insert(row.gr_no.as_str()) {
                return Err(crate::domain::HubError::Validation(format!(
                    "duplicate kaat row for GR number {}",
                    row.gr_no
                )));
            }
        }

        let mut ids = std::collections::HashSet::new();
        for record in &self.transit_records {
            if !ids.insert(record.id) {
                return Err(crate::domain::HubError::Validation(format!(
                    "duplicate transit record id {}",
                    record.id
                )));
            }
        }
        Ok(())
    }
}
