//! TOML configuration: provider selection and VaR defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::risk::VarParams;
use crate::Result;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "PORTFOLIO_VAR_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub risk: RiskConfig,
}

/// Which market-data source to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderSource {
    #[default]
    Yahoo,
    Csv,
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub source: ProviderSource,
    /// Chart API root for the yahoo source
    pub base_url: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Directory of `<IDENTIFIER>.csv` files for the csv source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            source: ProviderSource::Yahoo,
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            user_agent: concat!("portfolio-var/", env!("CARGO_PKG_VERSION")).to_string(),
            csv_dir: None,
        }
    }
}

/// `[risk]` section: defaults for VaR requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub confidence: f64,
    /// Horizon in days
    pub time_horizon: f64,
    pub num_simulations: usize,
    /// Seed for Monte Carlo runs; entropy when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        let params = VarParams::default();
        Self {
            confidence: params.confidence,
            time_horizon: params.time_horizon,
            num_simulations: params.num_simulations,
            seed: None,
        }
    }
}

impl RiskConfig {
    pub fn params(&self) -> VarParams {
        VarParams {
            confidence: self.confidence,
            time_horizon: self.time_horizon,
            num_simulations: self.num_simulations,
        }
    }
}

impl Config {
    /// Get the default config file path.
    ///
    /// Default path: `<config dir>/portfolio-var/config.toml`
    /// Can be overridden with the `PORTFOLIO_VAR_CONFIG` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("", "", "portfolio-var")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("portfolio-var.toml"))
    }

    /// Load from the default path.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load from a specific path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write to a specific path, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
