//! Kaat charge computation

use crate::domain::reference::{HubRate, PricingMode};
use crate::domain::UnifiedShipment;
use rust_decimal::prelude::RoundingStrategy;
use rust_decimal::Decimal;

/// Charge for a shipment under a hub rate, unrounded
///
/// `per_kg` multiplies by weight and `per_pkg` by package count. A missing
/// quantity or unit rate counts as zero. The result is then raised to
/// `min_charge` when one is set.
pub fn compute_charge(shipment: &UnifiedShipment, rate: &HubRate) -> Decimal {
    compute_amount(shipment.weight, shipment.packages, rate)
}

/// [`compute_charge`] on raw quantities
pub fn compute_amount(weight: Option<Decimal>, packages: Option<i32>, rate: &HubRate) -> Decimal {
    let quantity = match rate.pricing_mode {
        PricingMode::PerKg => weight.unwrap_or(Decimal::ZERO),
        PricingMode::PerPkg => packages.map(Decimal::from).unwrap_or(Decimal::ZERO),
    };
    let amount = rate.unit_rate().unwrap_or(Decimal::ZERO) * quantity;

    match rate.min_charge {
        Some(floor) if amount < floor => floor,
        _ => amount,
    }
}

/// Rounds a kaat amount for storage, half away from zero
pub fn round_kaat(amount: Decimal, decimal_places: u32) -> Decimal {
    amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero)
}
