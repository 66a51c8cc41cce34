use anyhow::{bail, Result};
use cloud_carbon_monitor::{CloudProvider, ServiceCategory, UsageEntry, AWS_REGIONS, DEFAULT_REGION};
use cloud_carbon_monitor::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Organization,
    Provider,
    Category,
    Spend,
    Region,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::Organization,
        FormField::Provider,
        FormField::Category,
        FormField::Spend,
        FormField::Region,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Organization => "Organization",
            FormField::Provider => "Provider",
            FormField::Category => "Service",
            FormField::Spend => "Monthly spend",
            FormField::Region => "Region",
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, FormField::Organization | FormField::Spend)
    }
}

/// State of the new-entry popup.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryForm {
    focus: usize,
    organization: String,
    provider: usize,
    category: usize,
    spend: String,
    region: usize,
    error: Option<String>,
}

impl EntryForm {
    pub fn new() -> Self {
        let region = AWS_REGIONS
            .iter()
            .position(|(key, _)| *key == DEFAULT_REGION)
            .unwrap_or(0);

        Self {
            focus: 0,
            organization: String::new(),
            provider: 0,
            category: 0,
            spend: String::new(),
            region,
            error: None,
        }
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn previous_field(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    /// Steps the focused enumerated field; text fields are left alone.
    pub fn cycle(&mut self, forward: bool) {
        let (index, len) = match self.focused() {
            FormField::Provider => (&mut self.provider, CloudProvider::all().len()),
            FormField::Category => (&mut self.category, ServiceCategory::known().len()),
            FormField::Region => (&mut self.region, AWS_REGIONS.len()),
            _ => return,
        };
        *index = if forward {
            (*index + 1) % len
        } else {
            (*index + len - 1) % len
        };
    }

    pub fn input_char(&mut self, c: char) {
        match self.focused() {
            FormField::Organization => self.organization.push(c),
            FormField::Spend if c.is_ascii_digit() || c == '.' => self.spend.push(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        match self.focused() {
            FormField::Organization => {
                self.organization.pop();
            }
            FormField::Spend => {
                self.spend.pop();
            }
            _ => {}
        }
    }

    pub fn value(&self, field: FormField) -> String {
        match field {
            FormField::Organization => self.organization.clone(),
            FormField::Provider => self.provider().name().to_string(),
            FormField::Category => self.category().description().to_string(),
            FormField::Spend => self.spend.clone(),
            FormField::Region => {
                let (key, label) = AWS_REGIONS[self.region];
                format!("{} ({})", label, key)
            }
        }
    }

    pub fn is_text_field(&self, field: FormField) -> bool {
        field.is_text()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    fn provider(&self) -> CloudProvider {
        CloudProvider::all()[self.provider]
    }

    fn category(&self) -> ServiceCategory {
        ServiceCategory::known()[self.category].clone()
    }

    pub fn build_entry(&self, timestamp: DateTime<Utc>) -> Result<UsageEntry> {
        let organization = self.organization.trim();
        if organization.is_empty() {
            bail!("Organization is required");
        }

        let spend: f64 = match self.spend.trim().parse() {
            Ok(spend) => spend,
            Err(_) => bail!("Monthly spend must be a number"),
        };
        if !spend.is_finite() || spend < 0.0 {
            bail!("Monthly spend must be zero or more");
        }

        Ok(UsageEntry::new(
            timestamp,
            organization,
            self.provider(),
            self.category(),
            spend,
            AWS_REGIONS[self.region].0,
        ))
    }
}

impl Default for EntryForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn type_text(form: &mut EntryForm, text: &str) {
        for c in text.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn test_new_form_defaults() {
        let form = EntryForm::new();
        assert_eq!(form.focused(), FormField::Organization);
        assert_eq!(form.value(FormField::Provider), "Amazon Web Services");
        assert!(form.value(FormField::Region).contains(DEFAULT_REGION));
        assert_eq!(form.value(FormField::Category), "Compute (EC2, VM, Compute Engine)");
        assert!(form.error().is_none());
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = EntryForm::new();
        form.previous_field();
        assert_eq!(form.focused(), FormField::Region);
        form.next_field();
        assert_eq!(form.focused(), FormField::Organization);
    }

    #[test]
    fn test_cycle_only_affects_enumerated_fields() {
        let mut form = EntryForm::new();
        type_text(&mut form, "Acme");
        form.cycle(true);
        assert_eq!(form.value(FormField::Organization), "Acme");

        form.next_field();
        form.cycle(true);
        assert_eq!(form.value(FormField::Provider), "Google Cloud Platform");
        form.cycle(false);
        form.cycle(false);
        assert_eq!(form.value(FormField::Provider), "Microsoft Azure");
    }

    #[test]
    fn test_spend_accepts_only_numeric_input() {
        let mut form = EntryForm::new();
        for _ in 0..3 {
            form.next_field();
        }
        assert_eq!(form.focused(), FormField::Spend);

        type_text(&mut form, "12a5.5x");
        assert_eq!(form.value(FormField::Spend), "125.5");
        form.backspace();
        assert_eq!(form.value(FormField::Spend), "125.");
    }

    #[test]
    fn test_build_entry() {
        let mut form = EntryForm::new();
        type_text(&mut form, "  Acme ");
        form.next_field();
        form.cycle(true);
        form.next_field();
        form.cycle(true);
        form.next_field();
        type_text(&mut form, "250");

        let timestamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let entry = form.build_entry(timestamp).unwrap();
        assert_eq!(entry.organization(), "Acme");
        assert_eq!(entry.provider(), CloudProvider::Gcp);
        assert_eq!(entry.service_category(), &ServiceCategory::Storage);
        assert_eq!(entry.monthly_spend(), 250.0);
        assert_eq!(entry.region(), DEFAULT_REGION);
        assert_eq!(entry.timestamp(), timestamp);
    }

    #[test]
    fn test_build_entry_rejects_incomplete_input() {
        let mut form = EntryForm::new();
        assert!(form.build_entry(Utc::now()).is_err());

        type_text(&mut form, "Acme");
        let err = form.build_entry(Utc::now()).unwrap_err();
        assert!(err.to_string().contains("spend"));

        for _ in 0..3 {
            form.next_field();
        }
        type_text(&mut form, "1.2.3");
        assert!(form.build_entry(Utc::now()).is_err());
    }
}
