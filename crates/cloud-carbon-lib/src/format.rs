use crate::data_structures::{EmissionUnit, EstimationResult};

pub const KG_PER_TON: f64 = 1000.0;
pub const LBS_PER_TON: f64 = 2204.62;

/// Below this many tons the tons display switches to kilograms.
const TONS_DISPLAY_FLOOR: f64 = 0.01;

/// Rounds half away from zero at the given number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        // no fractional digits left at this magnitude
        return value;
    }
    scaled.round() / factor
}

/// Renders a CO₂e mass without a data-source suffix.
pub fn format_mass(co2e_tons: f64, unit: EmissionUnit) -> String {
    match unit {
        EmissionUnit::Tons if co2e_tons < TONS_DISPLAY_FLOOR => {
            format_mass(co2e_tons, EmissionUnit::Kg)
        }
        EmissionUnit::Tons => format!("{:.2} tons CO₂e", co2e_tons),
        EmissionUnit::Kg => format!("{:.1} kg CO₂e", co2e_tons * KG_PER_TON),
        EmissionUnit::Lbs => format!("{:.1} lbs CO₂e", co2e_tons * LBS_PER_TON),
    }
}

pub fn format_emissions(result: &EstimationResult, unit: EmissionUnit) -> String {
    format!(
        "{} ({})",
        format_mass(result.co2e_tons(), unit),
        result.data_source().label()
    )
}

pub fn format_energy(kilowatt_hours: f64) -> String {
    format!("{:.2} kWh", kilowatt_hours)
}

pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "CAD" => Some("C$"),
        "AUD" => Some("A$"),
        "JPY" | "CNY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

pub fn format_currency(amount: f64, code: &str) -> String {
    let prefix = match currency_symbol(code) {
        Some(symbol) => symbol.to_string(),
        None => format!("{} ", code),
    };

    let body = match code.trim().to_ascii_uppercase().as_str() {
        "JPY" | "CNY" => format_grouped(amount.round(), 0),
        _ => format_grouped(amount, 3),
    };

    format!("{}{}", prefix, body)
}

pub fn format_number(n: u64) -> String {
    group_digits(&n.to_string())
}

/// Thousands separators plus at most `max_fraction_digits`, trailing zeros trimmed.
fn format_grouped(amount: f64, max_fraction_digits: usize) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let rendered = format!("{:.*}", max_fraction_digits, amount.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part.trim_end_matches('0')),
        None => (rendered.as_str(), ""),
    };

    let mut result = String::new();
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    if amount < 0.0 && !is_zero {
        result.push('-');
    }
    result.push_str(&group_digits(int_part));
    if !frac_part.is_empty() {
        result.push('.');
        result.push_str(frac_part);
    }
    result
}

fn group_digits(digits: &str) -> String {
    let mut result = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
