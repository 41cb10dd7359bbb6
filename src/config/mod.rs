use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    core::services::DEFAULT_SUGGESTION_LIMIT,
    errors::{LedgerError, Result},
    utils::persistence::write_atomic,
};

/// Overrides the application directory when set.
pub const HOME_ENV: &str = "BUDGET_LEDGER_HOME";

const DEFAULT_DIR_NAME: &str = ".budget_ledger";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_SNAPSHOT_FILE: &str = "budget.json";

/// Returns the application-specific data directory, defaulting to `~/.budget_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the snapshot; the application directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub snapshot_file: String,
    pub suggestion_limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    pub currency_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            snapshot_file: DEFAULT_SNAPSHOT_FILE.into(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            log_filter: None,
            currency_symbol: "£".into(),
        }
    }
}

impl Config {
    /// Full path of the ledger snapshot, resolved against `base`.
    pub fn snapshot_path(&self, base: &Path) -> PathBuf {
        let dir = match &self.data_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        };
        let file = self.snapshot_file.trim();
        dir.join(if file.is_empty() { DEFAULT_SNAPSHOT_FILE } else { file })
    }

    /// Formats `amount` with the configured currency symbol, sign first.
    pub fn format_amount(&self, amount: f64) -> String {
        let sign = if amount < 0.0 { "-" } else { "" };
        format!("{sign}{}{:.2}", self.currency_symbol, amount.abs())
    }
}

/// Loads and saves `config.json` in the application directory.
pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
            base,
        })
    }

    /// Missing file yields defaults; an unreadable one is a config error.
    pub fn load(&self) -> Result<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| {
            LedgerError::Config(format!("{}: {err}", self.path.display()))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, json.as_bytes())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
