use crate::data_structures::{EnergyBreakdown, EstimationResult, ServiceCategory, UsageInput};
use crate::error::EstimationError;
use crate::format::round_to;
use crate::pricing::PricingProvider;
use crate::regions::RegionFactorTable;
use tracing::{debug, warn};

// Energy coefficients, Cloud Carbon Footprint methodology.
const COMPUTE_KWH_PER_VCPU_HOUR: f64 = 0.000071;
const MEMORY_KWH_PER_GB_HOUR: f64 = 0.000392;
const SSD_KWH_PER_GB_MONTH: f64 = 0.000047;
const NETWORK_KWH_PER_GB: f64 = 0.001;
const POWER_USAGE_EFFECTIVENESS: f64 = 1.135;

// Average instance shape behind an instance-hour.
const AVERAGE_VCPUS: f64 = 2.0;
const AVERAGE_MEMORY_GB: f64 = 8.0;
const DATABASE_CPU_INTENSITY: f64 = 4.0;

// Secondary quantities implied by the primary one.
const COMPUTE_STORAGE_GB_PER_HOUR: f64 = 20.0;
const COMPUTE_TRANSFER_GB_PER_HOUR: f64 = 10.0;
const STORAGE_TRANSFER_RATIO: f64 = 0.1;
const DATABASE_STORAGE_GB_PER_HOUR: f64 = 100.0;
const DATABASE_TRANSFER_GB_PER_HOUR: f64 = 5.0;

// Spend split for mixed or unrecognized categories.
const MIXED_COMPUTE_SHARE: f64 = 0.5;
const MIXED_STORAGE_SHARE: f64 = 0.3;
const MIXED_NETWORK_SHARE: f64 = 0.2;

const GRAMS_PER_METRIC_TON: f64 = 1_000_000.0;

const FALLBACK_TONS_PER_UNIT_SPEND: f64 = 0.0001;
const FALLBACK_KWH_PER_UNIT_SPEND: f64 = 2.1;

#[derive(Debug, Clone, Copy)]
struct UsageQuantities {
    instance_hours: f64,
    gb_storage: f64,
    gb_transfer: f64,
}

pub struct EstimationEngine {
    pricing: PricingProvider,
    regions: RegionFactorTable,
}

impl EstimationEngine {
    pub fn new() -> Self {
        Self {
            pricing: PricingProvider::new(),
            regions: RegionFactorTable::new(),
        }
    }

    pub fn with_tables(pricing: PricingProvider, regions: RegionFactorTable) -> Self {
        Self { pricing, regions }
    }

    /// Always produces a result: the detailed estimate falls back to the
    /// basic one, which falls back to a fixed spend ratio.
    pub fn estimate(
        &self,
        monthly_spend: f64,
        service_category: &ServiceCategory,
        region: &str,
        credentials_present: bool,
    ) -> EstimationResult {
        let spend = sanitize_spend(monthly_spend);

        if credentials_present {
            debug!(category = %service_category, region, "using detailed estimate");
            match self.estimate_detailed(spend, service_category, region) {
                Ok(result) => return result,
                Err(e) => {
                    warn!(
                        error = %e,
                        category = %service_category,
                        "detailed estimate failed, falling back to basic"
                    );
                }
            }
        }

        match self.estimate_basic(spend, service_category, region) {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    error = %e,
                    category = %service_category,
                    "basic estimate failed, using spend ratio"
                );
                Self::estimate_from_spend_ratio(spend)
            }
        }
    }

    pub fn estimate_input(&self, input: &UsageInput) -> EstimationResult {
        self.estimate(
            input.monthly_spend(),
            input.service_category(),
            input.region(),
            input.credentials_present(),
        )
    }

    pub fn estimate_detailed(
        &self,
        monthly_spend: f64,
        service_category: &ServiceCategory,
        region: &str,
    ) -> Result<EstimationResult, EstimationError> {
        let emissions_factor = self.regions.emissions_factor(region);
        let usage = self.usage_from_spend(monthly_spend, service_category)?;

        let breakdown = match service_category {
            ServiceCategory::Compute => EnergyBreakdown::new(
                usage.instance_hours
                    * (COMPUTE_KWH_PER_VCPU_HOUR * AVERAGE_VCPUS
                        + MEMORY_KWH_PER_GB_HOUR * AVERAGE_MEMORY_GB),
                0.0,
                0.0,
                0.0,
            ),
            ServiceCategory::Storage => {
                EnergyBreakdown::new(0.0, usage.gb_storage * SSD_KWH_PER_GB_MONTH, 0.0, 0.0)
            }
            ServiceCategory::Networking => {
                EnergyBreakdown::new(0.0, 0.0, usage.gb_transfer * NETWORK_KWH_PER_GB, 0.0)
            }
            ServiceCategory::Database => EnergyBreakdown::new(
                usage.instance_hours * COMPUTE_KWH_PER_VCPU_HOUR * DATABASE_CPU_INTENSITY,
                usage.gb_storage * SSD_KWH_PER_GB_MONTH,
                0.0,
                0.0,
            ),
            _ => EnergyBreakdown::new(
                usage.instance_hours * COMPUTE_KWH_PER_VCPU_HOUR * AVERAGE_VCPUS,
                usage.gb_storage * SSD_KWH_PER_GB_MONTH,
                usage.gb_transfer * NETWORK_KWH_PER_GB,
                0.0,
            ),
        };

        let total_kwh = ensure_finite(breakdown.total() * POWER_USAGE_EFFECTIVENESS, "energy")?;
        let co2e_tons = ensure_finite(total_kwh * emissions_factor, "emissions")?;

        Ok(EstimationResult::new(
            round_to(co2e_tons, 3),
            round_to(total_kwh, 2),
            monthly_spend,
            true,
            Some(breakdown),
        ))
    }

    pub fn estimate_basic(
        &self,
        monthly_spend: f64,
        service_category: &ServiceCategory,
        region: &str,
    ) -> Result<EstimationResult, EstimationError> {
        let usage = ensure_finite(
            monthly_spend * self.pricing.spend_multiplier(service_category),
            "usage estimate",
        )?;
        let energy = ensure_finite(
            usage * self.pricing.energy_multiplier(service_category),
            "energy",
        )?;
        let carbon_intensity = self.regions.carbon_intensity(region);
        let co2e_tons =
            ensure_finite(energy * carbon_intensity / GRAMS_PER_METRIC_TON, "emissions")?;

        Ok(EstimationResult::new(
            round_to(co2e_tons, 2),
            round_to(energy, 2),
            monthly_spend,
            false,
            None,
        ))
    }

    pub fn estimate_from_spend_ratio(monthly_spend: f64) -> EstimationResult {
        EstimationResult::new(
            round_to(monthly_spend * FALLBACK_TONS_PER_UNIT_SPEND, 2),
            round_to((monthly_spend * FALLBACK_KWH_PER_UNIT_SPEND).min(f64::MAX), 2),
            monthly_spend,
            false,
            None,
        )
    }

    fn usage_from_spend(
        &self,
        spend: f64,
        service_category: &ServiceCategory,
    ) -> Result<UsageQuantities, EstimationError> {
        let prices = self.pricing.unit_pricing();

        let usage = match service_category {
            ServiceCategory::Compute => {
                let instance_hours =
                    per_unit(spend, prices.compute_instance_hour(), "compute instance hour")?;
                UsageQuantities {
                    instance_hours,
                    gb_storage: instance_hours * COMPUTE_STORAGE_GB_PER_HOUR,
                    gb_transfer: instance_hours * COMPUTE_TRANSFER_GB_PER_HOUR,
                }
            }
            ServiceCategory::Storage => {
                let gb_storage = per_unit(spend, prices.storage_gb_month(), "storage GB-month")?;
                UsageQuantities {
                    instance_hours: 0.0,
                    gb_storage,
                    gb_transfer: gb_storage * STORAGE_TRANSFER_RATIO,
                }
            }
            ServiceCategory::Networking => UsageQuantities {
                instance_hours: 0.0,
                gb_storage: 0.0,
                gb_transfer: per_unit(spend, prices.transfer_gb(), "data transfer GB")?,
            },
            ServiceCategory::Database => {
                let db_hours =
                    per_unit(spend, prices.database_instance_hour(), "database instance hour")?;
                UsageQuantities {
                    instance_hours: db_hours,
                    gb_storage: db_hours * DATABASE_STORAGE_GB_PER_HOUR,
                    gb_transfer: db_hours * DATABASE_TRANSFER_GB_PER_HOUR,
                }
            }
            _ => UsageQuantities {
                instance_hours: per_unit(
                    spend * MIXED_COMPUTE_SHARE,
                    prices.compute_instance_hour(),
                    "compute instance hour",
                )?,
                gb_storage: per_unit(
                    spend * MIXED_STORAGE_SHARE,
                    prices.storage_gb_month(),
                    "storage GB-month",
                )?,
                gb_transfer: per_unit(
                    spend * MIXED_NETWORK_SHARE,
                    prices.transfer_gb(),
                    "data transfer GB",
                )?,
            },
        };

        Ok(usage)
    }
}

impl Default for EstimationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Negative and non-finite spend are clamped to zero.
fn sanitize_spend(monthly_spend: f64) -> f64 {
    if !monthly_spend.is_finite() {
        warn!(monthly_spend, "non-finite monthly spend treated as zero");
        return 0.0;
    }
    if monthly_spend < 0.0 {
        warn!(monthly_spend, "negative monthly spend clamped to zero");
        return 0.0;
    }
    if monthly_spend == 0.0 {
        // normalizes -0.0
        return 0.0;
    }
    monthly_spend
}

fn per_unit(spend: f64, price: f64, item: &'static str) -> Result<f64, EstimationError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(EstimationError::InvalidUnitPrice { item, price });
    }
    ensure_finite(spend / price, "usage conversion")
}

fn ensure_finite(value: f64, stage: &'static str) -> Result<f64, EstimationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EstimationError::NonFinite { stage })
    }
}
