use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use cloud_carbon_monitor::prelude::*;
use cloud_carbon_monitor::{
    format_energy, format_number, AwsCredentials, ComparisonEngine, EstimationEngine,
    FileCredentialStore, RegionFactorTable, DEFAULT_REGION,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{info, warn};

mod config;
mod form;
mod logging;
mod widgets;

use config::{load_config, save_config, CarbonConfig, DataPaths};
use form::EntryForm;
use widgets::*;

#[derive(Debug, Clone, PartialEq)]
pub enum PopupType {
    Providers,
    Categories,
    Organizations,
    NewEntry,
}

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Directory holding the ledgers, credentials and config (default ~/.config/cloud-carbon).
    /// Every `*.jsonl` file below it is read as a usage ledger.
    #[arg(short = 'd', long = "data-dir", global = true)]
    data_dir: Option<String>,

    /// Currency code used for spend, saved to the config
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Emission display unit (tons, kg, lbs), saved to the config
    #[arg(long, global = true, value_parser = parse_unit)]
    unit: Option<EmissionUnit>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the terminal dashboard
    Dashboard,
    /// Estimate a single monthly spend without recording it
    Estimate {
        #[arg(long)]
        spend: f64,
        #[arg(long, default_value = "compute")]
        category: String,
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
        /// Use the detailed estimate that configured AWS credentials enable
        #[arg(long)]
        real: bool,
    },
    /// Append a usage entry to the ledger
    Record {
        #[arg(long)]
        organization: String,
        #[arg(long, value_parser = parse_provider)]
        provider: CloudProvider,
        #[arg(long)]
        category: String,
        #[arg(long)]
        spend: f64,
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },
    /// Manage the stored AWS credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    Set {
        #[arg(long)]
        access_key_id: String,
        #[arg(long)]
        secret_access_key: String,
        #[arg(long, default_value = DEFAULT_REGION)]
        region: String,
    },
    Clear,
    Show,
}

fn parse_unit(value: &str) -> std::result::Result<EmissionUnit, String> {
    EmissionUnit::parse(value).ok_or_else(|| format!("unknown unit '{}' (tons, kg, lbs)", value))
}

fn parse_provider(value: &str) -> std::result::Result<CloudProvider, String> {
    CloudProvider::parse(value)
        .ok_or_else(|| format!("unknown provider '{}' (aws, gcp, azure)", value))
}

pub struct AppState {
    pub tracker: FootprintTracker,
    pub config: CarbonConfig,
    pub paths: DataPaths,
    pub last_update: DateTime<Utc>,
    pub is_loading: bool,
    pub spinner_state: usize,
    pub data_loaded: bool,
    pub error_message: Option<String>,
    pub active_popup: Option<PopupType>,
    pub form: EntryForm,
}

impl AppState {
    fn new(config: CarbonConfig, paths: DataPaths) -> Self {
        Self {
            tracker: FootprintTracker::new(),
            config,
            paths,
            last_update: Utc::now(),
            is_loading: false,
            spinner_state: 0,
            data_loaded: false,
            error_message: None,
            active_popup: None,
            form: EntryForm::new(),
        }
    }

    /// Re-reads the credential store and every ledger in the data directory.
    fn load_data(&mut self) -> Result<()> {
        let paths = self.begin_reload();
        let loaded = load_tracker(&paths);
        self.finish_reload(loaded)
    }

    fn begin_reload(&mut self) -> DataPaths {
        self.is_loading = true;
        self.error_message = None;
        self.paths.clone()
    }

    fn finish_reload(&mut self, loaded: Result<FootprintTracker>) -> Result<()> {
        self.is_loading = false;
        self.last_update = Utc::now();

        match loaded {
            Ok(tracker) => {
                self.tracker = tracker;
                self.data_loaded = true;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "reload failed");
                self.error_message = Some(e.to_string());
                self.data_loaded = false;
                Err(e)
            }
        }
    }

    fn submit_form(&mut self) {
        let entry = match self.form.build_entry(Utc::now()) {
            Ok(entry) => entry,
            Err(e) => {
                self.form.set_error(e.to_string());
                return;
            }
        };

        match self.tracker.record_entry(self.paths.ledger(), entry) {
            Ok(result) => {
                info!(co2e_tons = result.co2e_tons(), "recorded entry from dashboard");
                self.active_popup = None;
                self.last_update = Utc::now();
            }
            Err(e) => self.form.set_error(e.to_string()),
        }
    }

    fn cycle_unit(&mut self) {
        self.config.unit = self.config.unit.next();
        if let Err(e) = save_config(&self.paths.config(), &self.config) {
            warn!(error = %e, "could not save config");
        }
    }

    fn toggle_popup(&mut self, popup: PopupType) {
        self.active_popup = if self.active_popup.as_ref() == Some(&popup) {
            None
        } else {
            Some(popup)
        };
    }

    fn update_spinner(&mut self) {
        self.spinner_state = (self.spinner_state + 1) % 10;
    }

    pub fn get_spinner_char(&self) -> char {
        match self.spinner_state {
            0 => '⠋',
            1 => '⠙',
            2 => '⠹',
            3 => '⠸',
            4 => '⠼',
            5 => '⠴',
            6 => '⠦',
            7 => '⠧',
            8 => '⠇',
            9 => '⠏',
            _ => '⠋',
        }
    }

    pub fn data_source_label(&self) -> String {
        let credentials = self.tracker.credentials();
        if credentials.is_present() {
            format!("AWS data ({})", credentials.region_or(DEFAULT_REGION))
        } else {
            "Estimated".to_string()
        }
    }

    pub fn target_percentage(&self) -> f64 {
        self.tracker.target_percentage(self.config.ghg_target_kg)
    }

    pub fn unit(&self) -> EmissionUnit {
        self.config.unit
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }
}

/// Reads credentials and every ledger under the data directory. Called
/// without the state lock held.
fn load_tracker(paths: &DataPaths) -> Result<FootprintTracker> {
    let store = FileCredentialStore::new(paths.credentials());
    let mut tracker = FootprintTracker::with_credentials(store.state()?);
    tracker.load_directory(paths.root())?;
    Ok(tracker)
}

const EVENT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Sends events from `next_event` until it fails or the receiver is dropped.
fn forward_events<F>(tx: mpsc::UnboundedSender<Event>, mut next_event: F)
where
    F: FnMut() -> std::io::Result<Option<Event>>,
{
    while !tx.is_closed() {
        match next_event() {
            Ok(Some(event)) => {
                if tx.send(event).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "terminal event polling failed");
                break;
            }
        }
    }
}

fn poll_terminal_event() -> std::io::Result<Option<Event>> {
    if event::poll(EVENT_POLL_TIMEOUT)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

fn spawn_event_reader() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::task::spawn_blocking(move || forward_events(tx, poll_terminal_event));
    rx
}

pub struct App {
    state: Arc<Mutex<AppState>>,
    exit: bool,
}

impl App {
    pub fn new(mut app_state: AppState) -> Self {
        if let Err(e) = app_state.load_data() {
            app_state.error_message = Some(format!("Initial load failed: {}", e));
        }

        Self {
            state: Arc::new(Mutex::new(app_state)),
            exit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let state_clone = Arc::clone(&self.state);

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(5));
            loop {
                interval.tick().await;

                let paths = match state_clone.lock() {
                    Ok(mut state) => state.begin_reload(),
                    Err(_) => break,
                };

                let task = tokio::task::spawn_blocking(move || load_tracker(&paths));
                let loaded = match task.await {
                    Ok(loaded) => loaded,
                    Err(e) => Err(e.into()),
                };

                if let Ok(mut state) = state_clone.lock() {
                    let _ = state.finish_reload(loaded);
                }
            }
        });

        let mut events = spawn_event_reader();
        let mut tick_interval = interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    if let Ok(mut state) = self.state.lock() {
                        state.update_spinner();
                    }

                    terminal.draw(|frame| self.draw(frame))?;
                }

                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
            }

            if self.exit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(8),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        if let Ok(state) = self.state.lock() {
            HeaderWidget::render(frame, chunks[0], &state);
            ProgressBarsWidget::render(frame, chunks[1], &state);
            StatisticsWidget::render(frame, middle[0], &state);
            ComparisonsWidget::render(frame, middle[1], &state);
            EntriesWidget::render(frame, chunks[3], &state);
            ShortcutsWidget::render(frame, chunks[4], &state);

            match &state.active_popup {
                Some(PopupType::Providers) => {
                    BreakdownPopupWidget::render_providers(frame, area, &state);
                }
                Some(PopupType::Categories) => {
                    BreakdownPopupWidget::render_categories(frame, area, &state);
                }
                Some(PopupType::Organizations) => {
                    BreakdownPopupWidget::render_organizations(frame, area, &state);
                }
                Some(PopupType::NewEntry) => {
                    EntryFormWidget::render(frame, area, &state);
                }
                None => {}
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        let Event::Key(key_event) = event else {
            return;
        };
        if key_event.kind != KeyEventKind::Press {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if state.active_popup == Some(PopupType::NewEntry) {
            match key_event.code {
                KeyCode::Esc => state.active_popup = None,
                KeyCode::Tab | KeyCode::Down => state.form.next_field(),
                KeyCode::BackTab | KeyCode::Up => state.form.previous_field(),
                KeyCode::Left => state.form.cycle(false),
                KeyCode::Right => state.form.cycle(true),
                KeyCode::Backspace => state.form.backspace(),
                KeyCode::Enter => state.submit_form(),
                KeyCode::Char(c) => state.form.input_char(c),
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') => self.exit = true,
            KeyCode::Char('r') => {
                let _ = state.load_data();
            }
            KeyCode::Char('u') => state.cycle_unit(),
            KeyCode::Char('p') => state.toggle_popup(PopupType::Providers),
            KeyCode::Char('c') => state.toggle_popup(PopupType::Categories),
            KeyCode::Char('o') => state.toggle_popup(PopupType::Organizations),
            KeyCode::Char('n') => {
                state.form = EntryForm::new();
                state.active_popup = Some(PopupType::NewEntry);
            }
            KeyCode::Esc => state.active_popup = None,
            _ => {}
        }
    }
}

fn print_estimate(result: &EstimationResult, config: &CarbonConfig) {
    let comparisons = ComparisonEngine::new().compare_emissions(result.co2e_tons());

    println!("Spend:      {}", format_currency(result.cost(), &config.currency));
    println!("Energy:     {}", format_energy(result.kilowatt_hours()));
    println!("Emissions:  {}", format_emissions(result, config.unit));
    if let Some(breakdown) = result.breakdown() {
        println!(
            "Breakdown:  compute {:.4} kWh, storage {:.4} kWh, networking {:.4} kWh",
            breakdown.compute(),
            breakdown.storage(),
            breakdown.networking()
        );
    }
    println!();
    println!("Equivalent to:");
    println!("  {} domestic round-trip flights", format_number(comparisons.domestic_flights()));
    println!("  {:.1} international round-trip flights", comparisons.international_flights());
    println!("  {:.1} smartphone years", comparisons.smartphone_years());
    println!("  {} phone charges", format_number(comparisons.phone_charges()));
    println!("  {} miles driven", format_number(comparisons.miles_driven()));
    println!("  {:.1} gallons of gasoline", comparisons.gasoline_gallons());
}

fn run_credentials(action: CredentialsCommand, paths: &DataPaths) -> Result<()> {
    let mut store = FileCredentialStore::new(paths.credentials());

    match action {
        CredentialsCommand::Set {
            access_key_id,
            secret_access_key,
            region,
        } => {
            if RegionFactorTable::label(&region).is_none() {
                warn!(region = %region, "region has no emissions data, defaults will be used");
            }
            let credentials = AwsCredentials::new(access_key_id, secret_access_key, region);
            store.save_default(&credentials)?;
            println!(
                "Saved credentials {} for {}",
                credentials.masked_access_key_id(),
                credentials.region()
            );
        }
        CredentialsCommand::Clear => {
            store.clear_default()?;
            println!("Cleared stored credentials");
        }
        CredentialsCommand::Show => match store.load_default()? {
            Some(credentials) if credentials.is_configured() => {
                let label =
                    RegionFactorTable::label(credentials.region()).unwrap_or("unknown region");
                println!("Access key: {}", credentials.masked_access_key_id());
                println!("Region:     {} ({})", credentials.region(), label);
            }
            _ => println!("No credentials configured, estimates use spend heuristics"),
        },
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let paths = DataPaths::resolve(args.data_dir.as_deref())?;

    let command = args.command.unwrap_or(Command::Dashboard);
    let log_file = matches!(command, Command::Dashboard).then(|| paths.log());
    logging::init_tracing(args.verbose, log_file.as_deref())?;

    let mut config = load_config(&paths.config()).unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        CarbonConfig::default()
    });

    // Explicit flags override the file and are remembered
    if args.currency.is_some() || args.unit.is_some() {
        if let Some(currency) = args.currency {
            config.currency = currency.to_ascii_uppercase();
        }
        if let Some(unit) = args.unit {
            config.unit = unit;
        }
        if let Err(e) = save_config(&paths.config(), &config) {
            warn!(error = %e, "could not save config");
        }
    }

    match command {
        Command::Dashboard => {
            let mut terminal = ratatui::init();
            let mut app = App::new(AppState::new(config, paths));

            let result = app.run(&mut terminal).await;

            ratatui::restore();

            result
        }
        Command::Estimate {
            spend,
            category,
            region,
            real,
        } => {
            let category = ServiceCategory::parse(&category);
            let result = EstimationEngine::new().estimate(spend, &category, &region, real);
            print_estimate(&result, &config);
            Ok(())
        }
        Command::Record {
            organization,
            provider,
            category,
            spend,
            region,
        } => {
            if organization.trim().is_empty() {
                bail!("--organization must not be empty");
            }
            let store = FileCredentialStore::new(paths.credentials());
            let mut tracker = FootprintTracker::with_credentials(store.state()?);
            let entry = UsageEntry::new(
                Utc::now(),
                organization.trim(),
                provider,
                ServiceCategory::parse(&category),
                spend,
                region,
            );
            let result = tracker.record_entry(paths.ledger(), entry)?;
            println!("Recorded in {}", paths.ledger().display());
            print_estimate(&result, &config);
            Ok(())
        }
        Command::Credentials { action } => run_credentials(action, &paths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyModifiers};
    use tempfile::TempDir;

    fn state_in(dir: &TempDir) -> AppState {
        let paths = DataPaths::resolve(dir.path().to_str()).unwrap();
        AppState::new(CarbonConfig::default(), paths)
    }

    fn fill_form(form: &mut EntryForm, organization: &str, spend: &str) {
        for c in organization.chars() {
            form.input_char(c);
        }
        for _ in 0..3 {
            form.next_field();
        }
        for c in spend.chars() {
            form.input_char(c);
        }
    }

    #[test]
    fn test_args_default_to_dashboard() {
        let args = Args::try_parse_from(["cloud-carbon"]).unwrap();
        assert!(args.command.is_none());

        let args =
            Args::try_parse_from(["cloud-carbon", "--unit", "kg", "estimate", "--spend", "5000"])
                .unwrap();
        assert_eq!(args.unit, Some(EmissionUnit::Kg));
        match args.command {
            Some(Command::Estimate { spend, category, region, real }) => {
                assert_eq!(spend, 5000.0);
                assert_eq!(category, "compute");
                assert_eq!(region, DEFAULT_REGION);
                assert!(!real);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_reject_unknown_provider() {
        let result = Args::try_parse_from([
            "cloud-carbon", "record", "--organization", "Acme", "--provider", "oracle",
            "--category", "compute", "--spend", "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_files() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);

        state.load_data().unwrap();
        assert!(state.data_loaded);
        assert!(state.tracker.is_empty());
        assert_eq!(state.data_source_label(), "Estimated");
    }

    #[test]
    fn test_load_reads_every_ledger_in_data_dir() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let team_ledger = dir.path().join("teams").join("platform.jsonl");
        std::fs::create_dir_all(team_ledger.parent().unwrap()).unwrap();
        std::fs::write(
            &team_ledger,
            r#"{"timestamp": "2024-01-01T00:00:00Z", "organization": "Platform", "provider": "gcp", "service_category": "storage", "monthly_spend": 40.0}"#,
        )
        .unwrap();
        std::fs::write(
            state.paths.ledger(),
            r#"{"timestamp": "2024-02-01T00:00:00Z", "organization": "Acme", "provider": "aws", "service_category": "compute", "monthly_spend": 10.0}"#,
        )
        .unwrap();

        state.load_data().unwrap();
        let organizations: Vec<_> = state
            .tracker
            .entries()
            .iter()
            .map(|tracked| tracked.entry().organization().to_string())
            .collect();
        assert_eq!(organizations, vec!["Platform", "Acme"]);
        assert_eq!(state.tracker.organization_breakdown().len(), 2);
    }

    #[test]
    fn test_loading_flag_spans_the_reload() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);

        let paths = state.begin_reload();
        assert!(state.is_loading);

        let loaded = load_tracker(&paths);
        state.finish_reload(loaded).unwrap();
        assert!(!state.is_loading);
        assert!(state.data_loaded);
    }

    #[test]
    fn test_failed_reload_keeps_entries_and_reports_error() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        state.tracker.add_entry(UsageEntry::new(
            Utc::now(),
            "Acme",
            CloudProvider::Aws,
            ServiceCategory::Compute,
            10.0,
            DEFAULT_REGION,
        ));

        state.begin_reload();
        assert!(state.finish_reload(Err(anyhow::anyhow!("disk gone"))).is_err());
        assert!(!state.is_loading);
        assert_eq!(state.tracker.entry_count(), 1);
        assert_eq!(state.error_message.as_deref(), Some("disk gone"));
    }

    #[test]
    fn test_load_picks_up_credentials() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        let mut store = FileCredentialStore::new(state.paths.credentials());
        store
            .save_default(&AwsCredentials::new("AKIAEXAMPLE", "secret", "eu-west-1"))
            .unwrap();

        state.load_data().unwrap();
        assert_eq!(state.data_source_label(), "AWS data (eu-west-1)");
    }

    #[test]
    fn test_submit_form_records_entry() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        state.active_popup = Some(PopupType::NewEntry);
        fill_form(&mut state.form, "Acme", "5000");

        state.submit_form();
        assert_eq!(state.active_popup, None);
        assert_eq!(state.tracker.entry_count(), 1);

        let mut reloaded = state_in(&dir);
        reloaded.load_data().unwrap();
        assert_eq!(reloaded.tracker.entry_count(), 1);
    }

    #[test]
    fn test_submit_invalid_form_keeps_popup_open() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);
        state.active_popup = Some(PopupType::NewEntry);

        state.submit_form();
        assert_eq!(state.active_popup, Some(PopupType::NewEntry));
        assert!(state.form.error().is_some());
        assert!(state.tracker.is_empty());
    }

    #[test]
    fn test_cycle_unit_persists() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);

        state.cycle_unit();
        assert_eq!(state.unit(), EmissionUnit::Kg);
        assert_eq!(load_config(&state.paths.config()).unwrap().unit, EmissionUnit::Kg);
    }

    #[test]
    fn test_forward_events_until_source_fails() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let quit = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        let mut source = vec![
            Err(std::io::Error::other("terminal closed")),
            Ok(Some(Event::Resize(80, 24))),
            Ok(None),
            Ok(Some(quit.clone())),
        ];

        forward_events(tx, || source.pop().unwrap_or(Ok(None)));

        assert_eq!(rx.try_recv().unwrap(), quit);
        assert_eq!(rx.try_recv().unwrap(), Event::Resize(80, 24));
        assert_eq!(rx.try_recv(), Err(mpsc::error::TryRecvError::Disconnected));
    }

    #[test]
    fn test_forward_events_stops_when_receiver_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let mut polls = 0;
        forward_events(tx, || {
            polls += 1;
            Ok(None)
        });
        assert_eq!(polls, 0);
    }

    #[test]
    fn test_toggle_popup() {
        let dir = TempDir::new().unwrap();
        let mut state = state_in(&dir);

        state.toggle_popup(PopupType::Providers);
        assert_eq!(state.active_popup, Some(PopupType::Providers));
        state.toggle_popup(PopupType::Categories);
        assert_eq!(state.active_popup, Some(PopupType::Categories));
        state.toggle_popup(PopupType::Categories);
        assert_eq!(state.active_popup, None);
        state.toggle_popup(PopupType::Organizations);
        assert_eq!(state.active_popup, Some(PopupType::Organizations));
    }
}
