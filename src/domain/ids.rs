//! Domain identifier types with validation
//!
//! Business keys (GR numbers, challan numbers) are validated string newtypes.
//! Surrogate row keys are `i64` newtypes so a city id can never be passed
//! where a carrier id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// GR number newtype wrapper
///
/// The GR ("goods receipt") number is the shipment identifier shared by every
/// shipment-related table. It is the join key for the reconciler and the
/// conflict key of the charge ledger.
///
/// # Examples
///
/// ```
/// use hubtrack::domain::ids::GrNumber;
/// use std::str::FromStr;
///
/// let gr = GrNumber::from_str(" KNP-1042 ").unwrap();
/// assert_eq!(gr.as_str(), "KNP-1042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GrNumber(String);

impl GrNumber {
    /// Creates a new GrNumber, trimming surrounding whitespace
    ///
    /// # Returns
    ///
    /// Returns `Err` if the value is empty after trimming
    pub fn new(gr: impl Into<String>) -> Result<Self, String> {
        let gr = gr.into();
        let trimmed = gr.trim();
        if trimmed.is_empty() {
            return Err("GR number cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the GR number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for GrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GrNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GrNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GrNumber> for String {
    fn from(gr: GrNumber) -> Self {
        gr.0
    }
}

impl AsRef<str> for GrNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Challan number newtype wrapper
///
/// The human-facing manifest number, unique per challan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallanNumber(String);

impl ChallanNumber {
    /// Creates a new ChallanNumber, trimming surrounding whitespace
    pub fn new(number: impl Into<String>) -> Result<Self, String> {
        let number = number.into();
        let trimmed = number.trim();
        if trimmed.is_empty() {
            return Err("Challan number cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the challan number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChallanNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChallanNumber {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChallanNumber {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChallanNumber> for String {
    fn from(number: ChallanNumber) -> Self {
        number.0
    }
}

impl AsRef<str> for ChallanNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Declares an `i64` surrogate-key newtype.
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw row key
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<i64>()
                    .map($name)
                    .map_err(|e| format!("Invalid {}: '{}' ({})", stringify!($name), s, e))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }
    };
}

row_id!(
    /// Row key of a transit record (one shipment on one challan)
    TransitRecordId
);
row_id!(
    /// Row key of a city
    CityId
);
row_id!(
    /// Row key of a transport company (carrier)
    TransportId
);
row_id!(
    /// Row key of a hub pricing rule
    HubRateId
);
row_id!(
    /// Row key of a branch (origin, hub, or destination office)
    BranchId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gr_number_trims() {
        let gr = GrNumber::new("  G1 ").unwrap();
        assert_eq!(gr.as_str(), "G1");
    }

    #[test]
    fn test_gr_number_empty() {
        assert!(GrNumber::new("   ").is_err());
        assert!(GrNumber::new("").is_err());
    }

    #[test]
    fn test_gr_number_serde_rejects_empty() {
        let result: std::result::Result<GrNumber, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_challan_number_display() {
        let challan = ChallanNumber::from_str("C-100").unwrap();
        assert_eq!(challan.to_string(), "C-100");
    }

    #[test]
    fn test_row_id_parse() {
        assert_eq!(CityId::from_str(" 42 ").unwrap(), CityId(42));
        assert!(TransportId::from_str("x").is_err());
    }

    #[test]
    fn test_row_id_serializes_transparent() {
        let json = serde_json::to_string(&HubRateId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
