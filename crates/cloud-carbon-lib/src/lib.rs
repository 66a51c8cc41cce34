pub mod comparison;
pub mod credentials;
pub mod data_structures;
pub mod error;
pub mod estimator;
pub mod format;
pub mod loader;
pub mod monitor;
pub mod pricing;
pub mod regions;

pub use comparison::ComparisonEngine;
pub use credentials::{
    AwsCredentials, CredentialState, CredentialStore, FileCredentialStore,
    InMemoryCredentialStore,
};
pub use data_structures::{
    CloudProvider, ComparisonResult, DataSource, EmissionUnit, EnergyBreakdown,
    EstimationResult, ServiceCategory, UsageEntry, UsageInput,
};
pub use error::{CredentialError, EstimationError};
pub use estimator::EstimationEngine;
pub use format::{format_currency, format_emissions, format_energy, format_mass, format_number};
pub use loader::DataLoader;
pub use monitor::{EmissionsTotals, FootprintTracker, TrackedEntry};
pub use pricing::{PricingProvider, UnitPricing};
pub use regions::{RegionFactorTable, AWS_REGIONS, DEFAULT_REGION};

pub use anyhow::Result;
pub use chrono::{DateTime, Utc};

pub mod prelude {
    pub use crate::credentials::{CredentialState, CredentialStore};
    pub use crate::data_structures::{
        CloudProvider, EmissionUnit, EstimationResult, ServiceCategory, UsageEntry,
    };
    pub use crate::format::{format_currency, format_emissions, format_mass};
    pub use crate::monitor::FootprintTracker;
    pub use anyhow::Result;
    pub use chrono::{DateTime, Utc};
}
