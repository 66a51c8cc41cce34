use std::collections::HashMap;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Grams CO₂e per kWh for regions missing from the intensity table.
pub const DEFAULT_CARBON_INTENSITY: f64 = 400.0;

/// Metric tons CO₂e per kWh for regions missing from the emissions-factor table.
pub const DEFAULT_EMISSIONS_FACTOR: f64 = 0.0004;

pub const AWS_REGIONS: [(&str, &str); 9] = [
    ("us-east-1", "US East (N. Virginia)"),
    ("us-west-2", "US West (Oregon)"),
    ("eu-west-1", "Europe (Ireland)"),
    ("ap-southeast-1", "Asia Pacific (Singapore)"),
    ("ap-northeast-1", "Asia Pacific (Tokyo)"),
    ("eu-central-1", "Europe (Frankfurt)"),
    ("us-west-1", "US West (N. California)"),
    ("ap-south-1", "Asia Pacific (Mumbai)"),
    ("ca-central-1", "Canada (Central)"),
];

/// Region grid numbers. The basic estimate reads `carbon_intensity` and the
/// detailed estimate reads `emissions_factor`; the two tables are maintained
/// separately and are not derived from each other.
pub struct RegionFactorTable {
    carbon_intensity: HashMap<String, f64>,
    emissions_factors: HashMap<String, f64>,
}

impl RegionFactorTable {
    pub fn new() -> Self {
        let mut carbon_intensity = HashMap::new();

        carbon_intensity.insert("us-east-1".to_string(), 429.0); // Virginia
        carbon_intensity.insert("us-west-2".to_string(), 350.0); // Oregon
        carbon_intensity.insert("eu-west-1".to_string(), 316.0); // Ireland
        carbon_intensity.insert("ap-southeast-1".to_string(), 431.0); // Singapore
        carbon_intensity.insert("ap-northeast-1".to_string(), 518.0); // Tokyo
        carbon_intensity.insert("eu-central-1".to_string(), 338.0); // Frankfurt
        carbon_intensity.insert("us-west-1".to_string(), 345.0); // California
        carbon_intensity.insert("ap-south-1".to_string(), 631.0); // Mumbai
        carbon_intensity.insert("ca-central-1".to_string(), 130.0); // Canada Central

        let mut emissions_factors = HashMap::new();

        emissions_factors.insert("us-east-1".to_string(), 0.000429);
        emissions_factors.insert("us-west-2".to_string(), 0.000350); // cleaner grid
        emissions_factors.insert("eu-west-1".to_string(), 0.000316); // renewable share
        emissions_factors.insert("ap-southeast-1".to_string(), 0.000431);
        emissions_factors.insert("ap-northeast-1".to_string(), 0.000518);
        emissions_factors.insert("eu-central-1".to_string(), 0.000338);
        emissions_factors.insert("us-west-1".to_string(), 0.000345);
        emissions_factors.insert("ap-south-1".to_string(), 0.000631); // coal-heavy grid
        emissions_factors.insert("ca-central-1".to_string(), 0.000130); // hydroelectric

        Self {
            carbon_intensity,
            emissions_factors,
        }
    }

    pub fn from_tables(
        carbon_intensity: HashMap<String, f64>,
        emissions_factors: HashMap<String, f64>,
    ) -> Self {
        Self {
            carbon_intensity,
            emissions_factors,
        }
    }

    pub fn carbon_intensity(&self, region: &str) -> f64 {
        self.carbon_intensity
            .get(region)
            .copied()
            .unwrap_or(DEFAULT_CARBON_INTENSITY)
    }

    pub fn emissions_factor(&self, region: &str) -> f64 {
        self.emissions_factors
            .get(region)
            .copied()
            .unwrap_or(DEFAULT_EMISSIONS_FACTOR)
    }

    pub fn label(region: &str) -> Option<&'static str> {
        AWS_REGIONS
            .iter()
            .find(|(key, _)| *key == region)
            .map(|(_, label)| *label)
    }
}

impl Default for RegionFactorTable {
    fn default() -> Self {
        Self::new()
    }
}
