use anyhow::{Context, Result};
use cloud_carbon_monitor::EmissionUnit;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_DIR: &str = "~/.config/cloud-carbon";
pub const DEFAULT_GHG_TARGET_KG: f64 = 3200.0;

const CONFIG_FILE: &str = "config.json";
const LEDGER_FILE: &str = "entries.jsonl";
const CREDENTIALS_FILE: &str = "credentials.json";
const LOG_FILE: &str = "cloud-carbon.log";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CarbonConfig {
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub unit: EmissionUnit,
    #[serde(default = "default_target")]
    pub ghg_target_kg: f64,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_target() -> f64 {
    DEFAULT_GHG_TARGET_KG
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            unit: EmissionUnit::default(),
            ghg_target_kg: DEFAULT_GHG_TARGET_KG,
        }
    }
}

/// Locations of everything the dashboard keeps on disk.
#[derive(Debug, Clone)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn resolve(data_dir: Option<&str>) -> Result<Self> {
        let raw = data_dir.unwrap_or(DEFAULT_DATA_DIR);
        let root = PathBuf::from(shellexpand::tilde(raw).as_ref());
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn ledger(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn credentials(&self) -> PathBuf {
        self.root.join(CREDENTIALS_FILE)
    }

    pub fn log(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }
}

pub fn load_config(path: &Path) -> Result<CarbonConfig> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: CarbonConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    } else {
        Ok(CarbonConfig::default())
    }
}

pub fn save_config(path: &Path, config: &CarbonConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}
