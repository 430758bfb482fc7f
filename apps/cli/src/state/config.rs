//! # Configuration State
//!
//! Shop details and paths, loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Command line (`--db`, `--config`)
//! 2. Environment variables (`SPARES_*`)
//! 3. Config file (`spares.toml`)
//! 4. Defaults (this file)
//!
//! ## Example `spares.toml`
//! ```toml
//! store_name = "Kariakoo Moto Spares"
//! store_address = ["Msimbazi Street", "Dar es Salaam"]
//! currency_code = "TZS"
//! currency_symbol = "TSh"
//! currency_decimals = 0
//! database_path = "/var/lib/spares/spares.db"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use spares_core::export::StoreInfo;
use spares_core::Money;

use crate::error::ApiError;

pub const ENV_DB_PATH: &str = "SPARES_DB_PATH";
pub const ENV_STORE_NAME: &str = "SPARES_STORE_NAME";
pub const ENV_CURRENCY: &str = "SPARES_CURRENCY";
pub const ENV_CONFIG: &str = "SPARES_CONFIG";

const CONFIG_FILE_NAME: &str = "spares.toml";
const DATABASE_FILE_NAME: &str = "spares.db";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigState {
    /// Store name (printed on reports)
    pub store_name: String,

    /// Store address lines (printed on reports)
    pub store_address: Vec<String>,

    /// Currency code (ISO 4217)
    pub currency_code: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places for currency
    pub currency_decimals: u8,

    /// Database file; the platform data directory when unset
    pub database_path: Option<PathBuf>,
}

impl Default for ConfigState {
    /// Tanzanian shillings, no decimals.
    fn default() -> Self {
        let store = StoreInfo::default();
        ConfigState {
            store_name: store.name,
            store_address: store.address_lines,
            currency_code: "TZS".to_string(),
            currency_symbol: store.currency_symbol,
            currency_decimals: store.decimals,
            database_path: None,
        }
    }
}

impl ConfigState {
    /// Loads configuration from file and environment.
    ///
    /// An explicit path (argument or `SPARES_CONFIG`) must exist; the file in
    /// the platform config directory is optional.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => ConfigState::from_file(&path)?,
            None => match default_config_file() {
                Some(path) if path.exists() => ConfigState::from_file(&path)?,
                _ => ConfigState::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        debug!(path = %path.display(), "Reading config file");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ConfigState::from_toml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: ConfigState = toml::from_str(text)?;
        if config.currency_decimals > 4 {
            return Err(anyhow!("currency_decimals must be between 0 and 4"));
        }
        Ok(config)
    }

    /// Applies `SPARES_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(name) = lookup(ENV_STORE_NAME).filter(|v| !v.is_empty()) {
            self.store_name = name;
        }

        if let Some(symbol) = lookup(ENV_CURRENCY).filter(|v| !v.is_empty()) {
            self.currency_symbol = symbol;
        }
    }

    /// Database file to open, creating the platform data directory when the
    /// default location is used.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = project_dirs().ok_or_else(|| anyhow!("could not determine app data directory"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating {}", data_dir.display()))?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn store_info(&self) -> StoreInfo {
        StoreInfo {
            name: self.store_name.clone(),
            address_lines: self.store_address.clone(),
            currency_symbol: self.currency_symbol.clone(),
            decimals: self.currency_decimals,
        }
    }

    /// Parses an amount typed on the command line.
    pub fn parse_money(&self, text: &str) -> Result<Money, ApiError> {
        Ok(Money::parse(text, self.currency_decimals)?)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "spares", "pos")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
