use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceCategory {
    Compute,
    Storage,
    Database,
    Networking,
    Serverless,
    AiMl,
    Analytics,
    Security,
    All,
    Other(String),
}

impl ServiceCategory {
    /// Never fails: unrecognized keys are kept as `Other` and estimated with the defaults.
    pub fn parse(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "compute" => ServiceCategory::Compute,
            "storage" => ServiceCategory::Storage,
            "database" => ServiceCategory::Database,
            "networking" => ServiceCategory::Networking,
            "serverless" => ServiceCategory::Serverless,
            "ai-ml" => ServiceCategory::AiMl,
            "analytics" => ServiceCategory::Analytics,
            "security" => ServiceCategory::Security,
            "all" => ServiceCategory::All,
            _ => ServiceCategory::Other(key.to_string()),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ServiceCategory::Compute => "compute",
            ServiceCategory::Storage => "storage",
            ServiceCategory::Database => "database",
            ServiceCategory::Networking => "networking",
            ServiceCategory::Serverless => "serverless",
            ServiceCategory::AiMl => "ai-ml",
            ServiceCategory::Analytics => "analytics",
            ServiceCategory::Security => "security",
            ServiceCategory::All => "all",
            ServiceCategory::Other(key) => key,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ServiceCategory::Compute => "Compute",
            ServiceCategory::Storage => "Storage",
            ServiceCategory::Database => "Database",
            ServiceCategory::Networking => "Networking",
            ServiceCategory::Serverless => "Serverless",
            ServiceCategory::AiMl => "AI / ML",
            ServiceCategory::Analytics => "Analytics",
            ServiceCategory::Security => "Security",
            ServiceCategory::All => "All services",
            ServiceCategory::Other(key) => key,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ServiceCategory::Compute => "Compute (EC2, VM, Compute Engine)",
            ServiceCategory::Storage => "Storage (S3, Cloud Storage, Blob)",
            ServiceCategory::Database => "Database (RDS, CloudSQL, SQL Database)",
            ServiceCategory::Networking => "Networking (VPC, Load Balancer)",
            ServiceCategory::Serverless => "Serverless (Lambda, Functions)",
            ServiceCategory::AiMl => "AI / ML (model training and inference)",
            ServiceCategory::Analytics => "Analytics (data processing jobs)",
            ServiceCategory::Security => "Security (event processing)",
            ServiceCategory::All => "All services (mixed usage)",
            ServiceCategory::Other(key) => key,
        }
    }

    pub fn known() -> [ServiceCategory; 9] {
        [
            ServiceCategory::Compute,
            ServiceCategory::Storage,
            ServiceCategory::Database,
            ServiceCategory::Networking,
            ServiceCategory::Serverless,
            ServiceCategory::AiMl,
            ServiceCategory::Analytics,
            ServiceCategory::Security,
            ServiceCategory::All,
        ]
    }
}

impl From<String> for ServiceCategory {
    fn from(key: String) -> Self {
        ServiceCategory::parse(&key)
    }
}

impl From<ServiceCategory> for String {
    fn from(category: ServiceCategory) -> Self {
        category.key().to_string()
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl CloudProvider {
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "aws" => Some(CloudProvider::Aws),
            "gcp" => Some(CloudProvider::Gcp),
            "azure" => Some(CloudProvider::Azure),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Azure => "azure",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "AWS",
            CloudProvider::Gcp => "GCP",
            CloudProvider::Azure => "Azure",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "Amazon Web Services",
            CloudProvider::Gcp => "Google Cloud Platform",
            CloudProvider::Azure => "Microsoft Azure",
        }
    }

    pub fn all() -> [CloudProvider; 3] {
        [CloudProvider::Aws, CloudProvider::Gcp, CloudProvider::Azure]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmissionUnit {
    #[default]
    Tons,
    Kg,
    Lbs,
}

impl EmissionUnit {
    pub fn parse(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "tons" | "t" => Some(EmissionUnit::Tons),
            "kg" => Some(EmissionUnit::Kg),
            "lbs" | "lb" => Some(EmissionUnit::Lbs),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmissionUnit::Tons => "tons",
            EmissionUnit::Kg => "kg",
            EmissionUnit::Lbs => "lbs",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            EmissionUnit::Tons => EmissionUnit::Kg,
            EmissionUnit::Kg => EmissionUnit::Lbs,
            EmissionUnit::Lbs => EmissionUnit::Tons,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Estimated,
    AwsData,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Estimated => "estimated",
            DataSource::AwsData => "AWS data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageInput {
    monthly_spend: f64,
    service_category: ServiceCategory,
    region: String,
    credentials_present: bool,
}

impl UsageInput {
    pub fn new(
        monthly_spend: f64,
        service_category: ServiceCategory,
        region: impl Into<String>,
        credentials_present: bool,
    ) -> Self {
        Self {
            monthly_spend,
            service_category,
            region: region.into(),
            credentials_present,
        }
    }

    pub fn monthly_spend(&self) -> f64 {
        self.monthly_spend
    }

    pub fn service_category(&self) -> &ServiceCategory {
        &self.service_category
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn credentials_present(&self) -> bool {
        self.credentials_present
    }
}

/// Pre-PUE kWh per sub-category, produced only by the detailed estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnergyBreakdown {
    compute: f64,
    storage: f64,
    networking: f64,
    memory: f64,
}

impl EnergyBreakdown {
    pub fn new(compute: f64, storage: f64, networking: f64, memory: f64) -> Self {
        Self {
            compute,
            storage,
            networking,
            memory,
        }
    }

    pub fn compute(&self) -> f64 {
        self.compute
    }

    pub fn storage(&self) -> f64 {
        self.storage
    }

    pub fn networking(&self) -> f64 {
        self.networking
    }

    pub fn memory(&self) -> f64 {
        self.memory
    }

    pub fn total(&self) -> f64 {
        self.compute + self.storage + self.networking + self.memory
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    co2e_tons: f64,
    kilowatt_hours: f64,
    cost: f64,
    is_real_data: bool,
    breakdown: Option<EnergyBreakdown>,
}

impl EstimationResult {
    pub fn new(
        co2e_tons: f64,
        kilowatt_hours: f64,
        cost: f64,
        is_real_data: bool,
        breakdown: Option<EnergyBreakdown>,
    ) -> Self {
        Self {
            co2e_tons,
            kilowatt_hours,
            cost,
            is_real_data,
            breakdown,
        }
    }

    pub fn co2e_tons(&self) -> f64 {
        self.co2e_tons
    }

    pub fn kilowatt_hours(&self) -> f64 {
        self.kilowatt_hours
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn is_real_data(&self) -> bool {
        self.is_real_data
    }

    pub fn breakdown(&self) -> Option<&EnergyBreakdown> {
        self.breakdown.as_ref()
    }

    pub fn data_source(&self) -> DataSource {
        if self.is_real_data {
            DataSource::AwsData
        } else {
            DataSource::Estimated
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    domestic_flights: u64,
    international_flights: f64,
    smartphone_years: f64,
    phone_charges: u64,
    miles_driven: u64,
    gasoline_gallons: f64,
}

impl ComparisonResult {
    pub fn new(
        domestic_flights: u64,
        international_flights: f64,
        smartphone_years: f64,
        phone_charges: u64,
        miles_driven: u64,
        gasoline_gallons: f64,
    ) -> Self {
        Self {
            domestic_flights,
            international_flights,
            smartphone_years,
            phone_charges,
            miles_driven,
            gasoline_gallons,
        }
    }

    pub fn domestic_flights(&self) -> u64 {
        self.domestic_flights
    }

    pub fn international_flights(&self) -> f64 {
        self.international_flights
    }

    pub fn smartphone_years(&self) -> f64 {
        self.smartphone_years
    }

    pub fn phone_charges(&self) -> u64 {
        self.phone_charges
    }

    pub fn miles_driven(&self) -> u64 {
        self.miles_driven
    }

    pub fn gasoline_gallons(&self) -> f64 {
        self.gasoline_gallons
    }
}

/// One recorded submission in the usage ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    timestamp: DateTime<Utc>,
    organization: String,
    provider: CloudProvider,
    service_category: ServiceCategory,
    monthly_spend: f64,
    #[serde(default = "default_region")]
    region: String,
}

fn default_region() -> String {
    crate::regions::DEFAULT_REGION.to_string()
}

impl UsageEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        organization: impl Into<String>,
        provider: CloudProvider,
        service_category: ServiceCategory,
        monthly_spend: f64,
        region: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            organization: organization.into(),
            provider,
            service_category,
            monthly_spend,
            region: region.into(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn provider(&self) -> CloudProvider {
        self.provider
    }

    pub fn service_category(&self) -> &ServiceCategory {
        &self.service_category
    }

    pub fn monthly_spend(&self) -> f64 {
        self.monthly_spend
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Configured credentials carry their own region, which takes precedence
    /// over the one recorded with the entry.
    pub fn to_input(&self, credentials: &crate::credentials::CredentialState) -> UsageInput {
        UsageInput::new(
            self.monthly_spend,
            self.service_category.clone(),
            credentials.region_or(&self.region),
            credentials.is_present(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_category_parse_is_total() {
        assert_eq!(ServiceCategory::parse("compute"), ServiceCategory::Compute);
        assert_eq!(ServiceCategory::parse(" AI-ML "), ServiceCategory::AiMl);
        assert_eq!(
            ServiceCategory::parse("quantum"),
            ServiceCategory::Other("quantum".to_string())
        );
        assert_eq!(ServiceCategory::parse("quantum").key(), "quantum");
    }

    #[test]
    fn test_category_keys_round_trip() {
        for category in ServiceCategory::known() {
            assert_eq!(ServiceCategory::parse(category.key()), category);
        }
    }

    #[test]
    fn test_unit_cycles_through_all_units() {
        let unit = EmissionUnit::Tons;
        assert_eq!(unit.next(), EmissionUnit::Kg);
        assert_eq!(unit.next().next(), EmissionUnit::Lbs);
        assert_eq!(unit.next().next().next(), EmissionUnit::Tons);
    }

    #[test]
    fn test_entry_serializes_category_as_key() {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let entry = UsageEntry::new(
            timestamp,
            "Acme",
            CloudProvider::Aws,
            ServiceCategory::AiMl,
            120.0,
            "eu-west-1",
        );

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["service_category"], "ai-ml");
        assert_eq!(json["provider"], "aws");
    }

    #[test]
    fn test_result_data_source() {
        let estimated = EstimationResult::new(1.0, 10.0, 100.0, false, None);
        let real = EstimationResult::new(1.0, 10.0, 100.0, true, None);
        assert_eq!(estimated.data_source(), DataSource::Estimated);
        assert_eq!(real.data_source(), DataSource::AwsData);
    }
}
