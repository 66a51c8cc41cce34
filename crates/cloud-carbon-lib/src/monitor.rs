use crate::comparison::ComparisonEngine;
use crate::credentials::CredentialState;
use crate::data_structures::{
    CloudProvider, ComparisonResult, EstimationResult, ServiceCategory, UsageEntry,
};
use crate::estimator::EstimationEngine;
use crate::format::KG_PER_TON;
use crate::loader::DataLoader;
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntry {
    entry: UsageEntry,
    result: EstimationResult,
}

impl TrackedEntry {
    pub fn entry(&self) -> &UsageEntry {
        &self.entry
    }

    pub fn result(&self) -> &EstimationResult {
        &self.result
    }
}

/// Emissions and spend accumulated for one slice of the entries.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EmissionsTotals {
    co2e_tons: f64,
    kilowatt_hours: f64,
    spend: f64,
    entries: usize,
}

impl EmissionsTotals {
    fn add(&mut self, result: &EstimationResult) {
        self.co2e_tons += result.co2e_tons();
        self.kilowatt_hours += result.kilowatt_hours();
        self.spend += result.cost();
        self.entries += 1;
    }

    pub fn co2e_tons(&self) -> f64 {
        self.co2e_tons
    }

    pub fn kilowatt_hours(&self) -> f64 {
        self.kilowatt_hours
    }

    pub fn spend(&self) -> f64 {
        self.spend
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn share_of(&self, total_tons: f64) -> f64 {
        if total_tons > 0.0 {
            self.co2e_tons / total_tons * 100.0
        } else {
            0.0
        }
    }
}

/// Estimates every recorded entry and keeps the running totals the dashboard shows.
pub struct FootprintTracker {
    entries: Vec<TrackedEntry>,
    credentials: CredentialState,
    engine: EstimationEngine,
    comparisons: ComparisonEngine,
    loader: DataLoader,
}

impl FootprintTracker {
    pub fn new() -> Self {
        Self::with_credentials(CredentialState::none())
    }

    pub fn with_credentials(credentials: CredentialState) -> Self {
        Self {
            entries: Vec::new(),
            credentials,
            engine: EstimationEngine::new(),
            comparisons: ComparisonEngine::new(),
            loader: DataLoader::new(),
        }
    }

    pub fn credentials(&self) -> &CredentialState {
        &self.credentials
    }

    /// Re-estimates all entries when the credential presence or region changes.
    pub fn set_credentials(&mut self, credentials: CredentialState) {
        if self.credentials != credentials {
            info!(
                present = credentials.is_present(),
                "credential state changed, re-estimating entries"
            );
            self.credentials = credentials;
            self.recalculate_results();
        }
    }

    pub fn load_data<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let entries = self.loader.load_from_file(path)?;
        self.replace_entries(entries);
        Ok(())
    }

    pub fn load_directory<P: AsRef<Path>>(&mut self, dir_path: P) -> Result<()> {
        let entries = self.loader.load_from_directory(dir_path)?;
        self.replace_entries(entries);
        Ok(())
    }

    pub fn add_entry(&mut self, entry: UsageEntry) -> EstimationResult {
        let result = self.estimate_entry(&entry);
        self.entries.push(TrackedEntry {
            entry,
            result: result.clone(),
        });
        self.entries
            .sort_by(|a, b| a.entry.timestamp().cmp(&b.entry.timestamp()));
        result
    }

    /// Appends the entry to the ledger at `path`, then tracks it.
    pub fn record_entry<P: AsRef<Path>>(
        &mut self,
        path: P,
        entry: UsageEntry,
    ) -> Result<EstimationResult> {
        self.loader.append_entry(path, &entry)?;
        Ok(self.add_entry(entry))
    }

    pub fn estimate_entry(&self, entry: &UsageEntry) -> EstimationResult {
        self.engine.estimate_input(&entry.to_input(&self.credentials))
    }

    pub fn entries(&self) -> &[TrackedEntry] {
        &self.entries
    }

    /// Most recent first.
    pub fn recent_entries(&self, limit: usize) -> impl Iterator<Item = &TrackedEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn totals(&self) -> EmissionsTotals {
        let mut totals = EmissionsTotals::default();
        for tracked in &self.entries {
            totals.add(&tracked.result);
        }
        totals
    }

    pub fn total_emissions_tons(&self) -> f64 {
        self.totals().co2e_tons()
    }

    pub fn total_spend(&self) -> f64 {
        self.totals().spend()
    }

    pub fn comparisons(&self) -> ComparisonResult {
        self.comparisons
            .compare_emissions(self.total_emissions_tons())
    }

    pub fn provider_breakdown(&self) -> HashMap<CloudProvider, EmissionsTotals> {
        let mut breakdown: HashMap<CloudProvider, EmissionsTotals> = HashMap::new();
        for tracked in &self.entries {
            breakdown
                .entry(tracked.entry.provider())
                .or_default()
                .add(&tracked.result);
        }
        breakdown
    }

    pub fn category_breakdown(&self) -> HashMap<ServiceCategory, EmissionsTotals> {
        let mut breakdown: HashMap<ServiceCategory, EmissionsTotals> = HashMap::new();
        for tracked in &self.entries {
            breakdown
                .entry(tracked.entry.service_category().clone())
                .or_default()
                .add(&tracked.result);
        }
        breakdown
    }

    pub fn organization_breakdown(&self) -> HashMap<String, EmissionsTotals> {
        let mut breakdown: HashMap<String, EmissionsTotals> = HashMap::new();
        for tracked in &self.entries {
            breakdown
                .entry(tracked.entry.organization().to_string())
                .or_default()
                .add(&tracked.result);
        }
        breakdown
    }

    /// Total emissions as a percentage of a GHG Protocol target given in kg.
    pub fn target_percentage(&self, target_kg: f64) -> f64 {
        if target_kg <= 0.0 {
            return 0.0;
        }
        self.total_emissions_tons() * KG_PER_TON / target_kg * 100.0
    }

    /// Percentage of spend estimated with the detailed, credential-backed formula.
    pub fn real_data_share(&self) -> f64 {
        let total_spend = self.total_spend();
        if total_spend <= 0.0 {
            return 0.0;
        }
        let real_spend: f64 = self
            .entries
            .iter()
            .filter(|tracked| tracked.result.is_real_data())
            .map(|tracked| tracked.result.cost())
            .sum();
        real_spend / total_spend * 100.0
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn replace_entries(&mut self, mut entries: Vec<UsageEntry>) {
        entries.sort_by(|a, b| a.timestamp().cmp(&b.timestamp()));
        self.entries = entries
            .into_iter()
            .map(|entry| TrackedEntry {
                result: self.estimate_entry(&entry),
                entry,
            })
            .collect();
    }

    fn recalculate_results(&mut self) {
        let entries: Vec<UsageEntry> =
            self.entries.drain(..).map(|tracked| tracked.entry).collect();
        self.replace_entries(entries);
    }
}

impl Default for FootprintTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::AwsCredentials;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn entry(
        offset_minutes: i64,
        org: &str,
        provider: CloudProvider,
        category: ServiceCategory,
        spend: f64,
    ) -> UsageEntry {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        UsageEntry::new(
            base + Duration::minutes(offset_minutes),
            org,
            provider,
            category,
            spend,
            "us-west-2",
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_new_tracker() {
        let tracker = FootprintTracker::new();
        assert!(tracker.is_empty());
        assert_eq!(tracker.entry_count(), 0);
        assert_eq!(tracker.comparisons(), ComparisonResult::default());
        assert_eq!(tracker.target_percentage(3200.0), 0.0);
    }

    #[test]
    fn test_add_entry_returns_estimate() {
        let mut tracker = FootprintTracker::new();
        let compute = entry(0, "Acme", CloudProvider::Aws, ServiceCategory::Compute, 5000.0);
        let result = tracker.add_entry(compute);

        assert!(close(result.co2e_tons(), 175.0));
        assert_eq!(tracker.entry_count(), 1);
        assert!(close(tracker.total_emissions_tons(), 175.0));
        assert_eq!(tracker.comparisons().domestic_flights(), 686);
    }

    #[test]
    fn test_running_totals_and_breakdowns() {
        let mut tracker = FootprintTracker::new();
        tracker.add_entry(entry(0, "Acme", CloudProvider::Aws, ServiceCategory::Compute, 5000.0));
        tracker.add_entry(entry(1, "Acme", CloudProvider::Gcp, ServiceCategory::Compute, 5000.0));
        tracker.add_entry(entry(2, "Globex", CloudProvider::Aws, ServiceCategory::Storage, 100.0));

        let totals = tracker.totals();
        assert_eq!(totals.entries(), 3);
        assert!(close(totals.spend(), 10_100.0));

        let providers = tracker.provider_breakdown();
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[&CloudProvider::Aws].entries(), 2);
        assert!(close(providers[&CloudProvider::Gcp].co2e_tons(), 175.0));

        let categories = tracker.category_breakdown();
        assert_eq!(categories[&ServiceCategory::Compute].entries(), 2);

        let organizations = tracker.organization_breakdown();
        assert_eq!(organizations["Globex"].entries(), 1);
    }

    #[test]
    fn test_entries_stay_sorted() {
        let mut tracker = FootprintTracker::new();
        tracker.add_entry(entry(10, "Later", CloudProvider::Aws, ServiceCategory::Compute, 1.0));
        tracker.add_entry(entry(0, "Earlier", CloudProvider::Aws, ServiceCategory::Compute, 1.0));

        assert_eq!(tracker.entries()[0].entry().organization(), "Earlier");
        let recent: Vec<_> = tracker.recent_entries(1).collect();
        assert_eq!(recent[0].entry().organization(), "Later");
    }

    #[test]
    fn test_credentials_switch_to_detailed_estimates() {
        let mut tracker = FootprintTracker::new();
        tracker.add_entry(entry(0, "Acme", CloudProvider::Aws, ServiceCategory::Storage, 100.0));
        assert_eq!(tracker.real_data_share(), 0.0);

        let credentials = AwsCredentials::new("AKIAEXAMPLE", "secret", "ca-central-1");
        tracker.set_credentials(CredentialState::from_credentials(Some(&credentials)));

        let tracked = &tracker.entries()[0];
        assert!(tracked.result().is_real_data());
        assert!(close(tracked.result().kilowatt_hours(), 0.23));
        assert_eq!(tracker.real_data_share(), 100.0);

        tracker.set_credentials(CredentialState::none());
        assert!(!tracker.entries()[0].result().is_real_data());
    }

    #[test]
    fn test_target_percentage() {
        let mut tracker = FootprintTracker::new();
        // 10 * 2000 * 0.05 = 1000 kWh at 350 g/kWh = 0.35 t
        tracker.add_entry(entry(0, "Acme", CloudProvider::Aws, ServiceCategory::Compute, 10.0));

        assert!((tracker.target_percentage(700.0) - 50.0).abs() < 1e-6);
        assert!((tracker.target_percentage(350.0) - 100.0).abs() < 1e-6);
        assert_eq!(tracker.target_percentage(0.0), 0.0);
    }

    #[test]
    fn test_record_and_reload() {
        let dir = TempDir::new().unwrap();
        let ledger = dir.path().join("entries.jsonl");

        let mut tracker = FootprintTracker::new();
        tracker
            .record_entry(
                &ledger,
                entry(0, "Acme", CloudProvider::Azure, ServiceCategory::Database, 17.0),
            )
            .unwrap();
        tracker
            .record_entry(
                &ledger,
                entry(5, "Acme", CloudProvider::Azure, ServiceCategory::Networking, 9.0),
            )
            .unwrap();

        let mut reloaded = FootprintTracker::new();
        reloaded.load_data(&ledger).unwrap();
        assert_eq!(reloaded.entries(), tracker.entries());
    }

    #[test]
    fn test_load_directory_merges_ledgers() {
        let dir = TempDir::new().unwrap();
        let mut writer = FootprintTracker::new();
        writer
            .record_entry(
                dir.path().join("entries.jsonl"),
                entry(10, "Acme", CloudProvider::Aws, ServiceCategory::Compute, 10.0),
            )
            .unwrap();
        writer
            .record_entry(
                dir.path().join("imported").join("globex.jsonl"),
                entry(0, "Globex", CloudProvider::Gcp, ServiceCategory::Storage, 20.0),
            )
            .unwrap();

        let mut tracker = FootprintTracker::new();
        tracker.load_directory(dir.path()).unwrap();

        assert_eq!(tracker.entry_count(), 2);
        assert_eq!(tracker.entries()[0].entry().organization(), "Globex");
        assert_eq!(tracker.organization_breakdown()["Acme"].entries(), 1);
    }

    #[test]
    fn test_share_of_total() {
        let mut tracker = FootprintTracker::new();
        tracker.add_entry(entry(0, "Acme", CloudProvider::Aws, ServiceCategory::Compute, 5000.0));
        tracker.add_entry(entry(1, "Acme", CloudProvider::Gcp, ServiceCategory::Compute, 15000.0));

        let total = tracker.total_emissions_tons();
        let providers = tracker.provider_breakdown();
        assert!((providers[&CloudProvider::Aws].share_of(total) - 25.0).abs() < 1e-9);
        assert_eq!(EmissionsTotals::default().share_of(0.0), 0.0);
    }
}
