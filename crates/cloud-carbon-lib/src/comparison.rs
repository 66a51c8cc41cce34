use crate::data_structures::ComparisonResult;
use crate::format::round_to;

// Metric tons CO₂e per unit.
pub const DOMESTIC_ROUND_TRIP_FLIGHT: f64 = 0.255;
pub const INTERNATIONAL_ROUND_TRIP_FLIGHT: f64 = 2.3;
pub const SMARTPHONE_YEAR: f64 = 0.07;
pub const PHONE_CHARGE: f64 = 0.0000084;
pub const MILE_DRIVEN: f64 = 0.000404;
pub const GALLON_OF_GASOLINE: f64 = 0.0089;

pub struct ComparisonEngine;

impl ComparisonEngine {
    pub fn new() -> Self {
        Self
    }

    /// Expresses a CO₂e mass in everyday equivalents. Negative input is
    /// treated as zero.
    pub fn compare_emissions(&self, co2e_tons: f64) -> ComparisonResult {
        let total = if co2e_tons > 0.0 { co2e_tons } else { 0.0 };

        ComparisonResult::new(
            Self::count(total, DOMESTIC_ROUND_TRIP_FLIGHT),
            Self::one_decimal(total, INTERNATIONAL_ROUND_TRIP_FLIGHT),
            Self::one_decimal(total, SMARTPHONE_YEAR),
            Self::count(total, PHONE_CHARGE),
            Self::count(total, MILE_DRIVEN),
            Self::one_decimal(total, GALLON_OF_GASOLINE),
        )
    }

    fn count(total: f64, per_unit: f64) -> u64 {
        // saturating cast
        (total / per_unit).round() as u64
    }

    fn one_decimal(total: f64, per_unit: f64) -> f64 {
        round_to(total / per_unit, 1)
    }
}

impl Default for ComparisonEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_emissions_compare_to_nothing() {
        let comparison = ComparisonEngine::new().compare_emissions(0.0);
        assert_eq!(comparison, ComparisonResult::default());
    }

    #[test]
    fn test_one_domestic_flight() {
        let comparison = ComparisonEngine::new().compare_emissions(0.255);
        assert_eq!(comparison.domestic_flights(), 1);
        assert_eq!(comparison.international_flights(), 0.1);
    }

    #[test]
    fn test_basic_example_total() {
        let comparison = ComparisonEngine::new().compare_emissions(175.0);

        assert_eq!(comparison.domestic_flights(), 686);
        assert_eq!(comparison.international_flights(), 76.1);
        assert_eq!(comparison.smartphone_years(), 2500.0);
        assert_eq!(comparison.phone_charges(), 20_833_333);
        assert_eq!(comparison.miles_driven(), 433_168);
        assert_eq!(comparison.gasoline_gallons(), 19662.9);
    }

    #[test]
    fn test_negative_input_is_zero() {
        let comparison = ComparisonEngine::new().compare_emissions(-3.0);
        assert_eq!(comparison, ComparisonResult::default());
    }

    #[test]
    fn test_counts_round_to_nearest() {
        let engine = ComparisonEngine::new();
        assert_eq!(engine.compare_emissions(0.38).domestic_flights(), 1);
        assert_eq!(engine.compare_emissions(0.39).domestic_flights(), 2);
    }
}
