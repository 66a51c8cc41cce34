use crate::data_structures::ServiceCategory;
use std::collections::HashMap;

pub const DEFAULT_SPEND_MULTIPLIER: f64 = 1000.0;
pub const DEFAULT_ENERGY_MULTIPLIER: f64 = 0.05;

/// USD per unit, used to turn spend into physical quantities for the detailed estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitPricing {
    compute_instance_hour: f64,
    storage_gb_month: f64,
    transfer_gb: f64,
    database_instance_hour: f64,
    memory_gb_hour: f64,
}

impl UnitPricing {
    pub fn new(
        compute_instance_hour: f64,
        storage_gb_month: f64,
        transfer_gb: f64,
        database_instance_hour: f64,
        memory_gb_hour: f64,
    ) -> Self {
        Self {
            compute_instance_hour,
            storage_gb_month,
            transfer_gb,
            database_instance_hour,
            memory_gb_hour,
        }
    }

    pub fn compute_instance_hour(&self) -> f64 {
        self.compute_instance_hour
    }

    pub fn storage_gb_month(&self) -> f64 {
        self.storage_gb_month
    }

    pub fn transfer_gb(&self) -> f64 {
        self.transfer_gb
    }

    pub fn database_instance_hour(&self) -> f64 {
        self.database_instance_hour
    }

    pub fn memory_gb_hour(&self) -> f64 {
        self.memory_gb_hour
    }
}

impl Default for UnitPricing {
    fn default() -> Self {
        Self::new(
            0.0464, // per instance hour (t3.medium average)
            0.023,  // per GB-month (S3 Standard)
            0.09,   // per GB transfer out
            0.017,  // per DB instance hour (db.t3.micro)
            0.0125, // per GB-hour of memory
        )
    }
}

/// Category tables for both estimates. The spend and energy multipliers drive
/// the basic estimate; `unit_pricing` drives the detailed one.
pub struct PricingProvider {
    spend_multipliers: HashMap<String, f64>,
    energy_multipliers: HashMap<String, f64>,
    unit_pricing: UnitPricing,
}

impl PricingProvider {
    pub fn new() -> Self {
        let mut spend_multipliers = HashMap::new();

        spend_multipliers.insert("compute".to_string(), 2000.0); // instance hours
        spend_multipliers.insert("storage".to_string(), 10000.0); // GB stored
        spend_multipliers.insert("database".to_string(), 1500.0); // DB hours
        spend_multipliers.insert("networking".to_string(), 5000.0); // GB transferred
        spend_multipliers.insert("serverless".to_string(), 100000.0); // invocations
        spend_multipliers.insert("ai-ml".to_string(), 500.0); // inference hours
        spend_multipliers.insert("analytics".to_string(), 1000.0); // processing jobs
        spend_multipliers.insert("security".to_string(), 800.0); // security events

        let mut energy_multipliers = HashMap::new();

        energy_multipliers.insert("compute".to_string(), 0.05); // kWh per instance hour
        energy_multipliers.insert("storage".to_string(), 0.001); // kWh per GB
        energy_multipliers.insert("database".to_string(), 0.08); // kWh per DB hour
        energy_multipliers.insert("networking".to_string(), 0.002); // kWh per GB transferred
        energy_multipliers.insert("serverless".to_string(), 0.0001); // kWh per invocation
        energy_multipliers.insert("ai-ml".to_string(), 0.15); // kWh per inference hour
        energy_multipliers.insert("analytics".to_string(), 0.12); // kWh per processing job
        energy_multipliers.insert("security".to_string(), 0.01); // kWh per security event

        Self {
            spend_multipliers,
            energy_multipliers,
            unit_pricing: UnitPricing::default(),
        }
    }

    pub fn with_unit_pricing(mut self, unit_pricing: UnitPricing) -> Self {
        self.unit_pricing = unit_pricing;
        self
    }

    pub fn spend_multiplier(&self, category: &ServiceCategory) -> f64 {
        self.spend_multipliers
            .get(category.key())
            .copied()
            .unwrap_or(DEFAULT_SPEND_MULTIPLIER)
    }

    pub fn energy_multiplier(&self, category: &ServiceCategory) -> f64 {
        self.energy_multipliers
            .get(category.key())
            .copied()
            .unwrap_or(DEFAULT_ENERGY_MULTIPLIER)
    }

    pub fn unit_pricing(&self) -> &UnitPricing {
        &self.unit_pricing
    }
}

impl Default for PricingProvider {
    fn default() -> Self {
        Self::new()
    }
}
