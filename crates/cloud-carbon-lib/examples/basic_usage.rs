use cloud_carbon_monitor::prelude::*;
use cloud_carbon_monitor::{format_number, AwsCredentials, InMemoryCredentialStore};
use std::env;

fn sample_entries() -> Vec<UsageEntry> {
    use cloud_carbon_monitor::CloudProvider::{Aws, Azure, Gcp};

    let now = Utc::now();
    vec![
        UsageEntry::new(now, "Acme", Aws, ServiceCategory::Compute, 5000.0, "us-west-2"),
        UsageEntry::new(now, "Acme", Aws, ServiceCategory::Storage, 100.0, "ca-central-1"),
        UsageEntry::new(now, "Globex", Gcp, ServiceCategory::Database, 850.0, "eu-west-1"),
        UsageEntry::new(now, "Globex", Azure, ServiceCategory::AiMl, 1200.0, "ap-south-1"),
    ]
}

fn print_report(tracker: &FootprintTracker, unit: EmissionUnit) {
    println!("\n--- Entries ---");
    for tracked in tracker.entries() {
        let entry = tracked.entry();
        println!(
            "{:<10} {:<6} {:<12} {:>12}  {}",
            entry.organization(),
            entry.provider().short_name(),
            entry.service_category().name(),
            format_currency(entry.monthly_spend(), "USD"),
            format_emissions(tracked.result(), unit)
        );
    }

    let totals = tracker.totals();
    println!("\n--- Totals ---");
    println!("Spend: {}", format_currency(totals.spend(), "USD"));
    println!("Energy: {:.2} kWh", totals.kilowatt_hours());
    println!("Emissions: {}", format_mass(totals.co2e_tons(), unit));

    let comparisons = tracker.comparisons();
    println!("\n--- Equivalent To ---");
    println!("Domestic round-trip flights: {}", format_number(comparisons.domestic_flights()));
    println!("International round-trip flights: {:.1}", comparisons.international_flights());
    println!("Smartphone years: {:.1}", comparisons.smartphone_years());
    println!("Phone charges: {}", format_number(comparisons.phone_charges()));
    println!("Miles driven: {}", format_number(comparisons.miles_driven()));
    println!("Gallons of gasoline: {:.1}", comparisons.gasoline_gallons());

    let target_kg = 3200.0;
    let percentage = tracker.target_percentage(target_kg);
    let bar_length = 20;
    let filled = (((percentage / 100.0) * bar_length as f64) as usize).min(bar_length);
    println!(
        "\nGHG target: [{}{}] {:.1}% of {} kg",
        "█".repeat(filled),
        "░".repeat(bar_length - filled),
        percentage,
        target_kg
    );
}

fn main() -> Result<()> {
    let mut tracker = FootprintTracker::new();
    let args: Vec<String> = env::args().collect();

    if args.len() >= 2 {
        println!("Loading usage ledger from: {}", args[1]);
        tracker.load_data(&args[1])?;
    } else {
        println!("No ledger given, using sample entries");
        for entry in sample_entries() {
            tracker.add_entry(entry);
        }
    }

    if tracker.is_empty() {
        println!("No usage entries found.");
        return Ok(());
    }

    println!("Estimated without credentials:");
    print_report(&tracker, EmissionUnit::Tons);

    let mut store = InMemoryCredentialStore::new();
    store.save_default(&AwsCredentials::new("AKIAEXAMPLE", "example-secret", "eu-west-1"))?;
    tracker.set_credentials(store.state()?);

    println!("\nEstimated with credentials configured:");
    print_report(&tracker, EmissionUnit::Kg);

    Ok(())
}
