//! TOML run configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "ETHUSDT"
//! interval = "1h"
//! data = "historical_data.csv"
//! start_date = "2022-01-01"
//! end_date = "2022-01-23"
//! initial_balance = 1000.0
//! taker_fee = 0.001
//!
//! [strategy]
//! type = "ma_crossover"
//! [strategy.params]
//! short_window = 11
//! long_window = 21
//! stop_loss_pct = 0.02
//! take_profit_pct = 0.05
//!
//! [optimize]
//! enabled = false
//! stop_loss_pct = 0.03
//! take_profit_pct = 0.06
//! ```

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tradesim_core::engine::EngineConfig;
use tradesim_core::fingerprint::StrategyConfig;

/// Errors from reading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid interval '{0}': expected <count><unit> with unit one of s, m, h, d, w, M, y")]
    InvalidInterval(String),

    #[error("start_date {start} is after end_date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid engine settings: {0}")]
    Engine(#[from] tradesim_core::error::ConfigError),
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub optimize: OptimizeSection,
}

/// `[backtest]`: data source, date window and account settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    #[serde(default)]
    pub symbol: String,
    /// Expected bar spacing, e.g. "1h". Only used to flag irregular data.
    #[serde(default)]
    pub interval: Option<String>,
    /// Path to the bar CSV.
    pub data: PathBuf,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_initial_balance")]
    pub initial_balance: f64,
    #[serde(default)]
    pub taker_fee: f64,
}

fn default_initial_balance() -> f64 {
    EngineConfig::default().initial_balance
}

/// What to do when one parameter combination fails during a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnError {
    #[default]
    Abort,
    Skip,
}

/// `[optimize]`: parameter sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizeSection {
    #[serde(default)]
    pub enabled: bool,
    /// Fixed exit levels applied to every combination.
    #[serde(default)]
    pub stop_loss_pct: Option<f64>,
    #[serde(default)]
    pub take_profit_pct: Option<f64>,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default)]
    pub on_error: OnError,
}

fn default_true() -> bool {
    true
}

impl Default for OptimizeSection {
    fn default() -> Self {
        Self {
            enabled: false,
            stop_loss_pct: None,
            take_profit_pct: None,
            parallel: true,
            on_error: OnError::Abort,
        }
    }
}

impl BacktestConfig {
    /// Parse a config from TOML text. Relative data paths are left as-is.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. A relative `data` path resolves against the
    /// directory holding the config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&text)?;
        if config.backtest.data.is_relative() {
            if let Some(dir) = path.parent() {
                config.backtest.data = dir.join(&config.backtest.data);
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config().validate()?;
        if let (Some(start), Some(end)) = (self.backtest.start_date, self.backtest.end_date) {
            if start > end {
                return Err(ConfigError::DateRange { start, end });
            }
        }
        self.interval()?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.backtest.initial_balance, self.backtest.taker_fee)
    }

    /// The configured bar spacing, if any.
    pub fn interval(&self) -> Result<Option<Duration>, ConfigError> {
        self.backtest.interval.as_deref().map(parse_interval).transpose()
    }
}

/// Parse `<count><unit>` into a duration.
///
/// Units: s, m (minutes), h, d, w, M (30-day months), y (365-day years).
pub fn parse_interval(text: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidInterval(text.to_string());
    let trimmed = text.trim();
    let unit = trimmed.chars().last().ok_or_else(invalid)?;
    let count: i64 = trimmed[..trimmed.len() - unit.len_utf8()]
        .parse()
        .map_err(|_| invalid())?;
    if count <= 0 {
        return Err(invalid());
    }
    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3_600,
        'd' => 86_400,
        'w' => 604_800,
        'M' => 2_592_000,
        'y' => 31_536_000,
        _ => return Err(invalid()),
    };
    count
        .checked_mul(seconds_per_unit)
        .and_then(Duration::try_seconds)
        .ok_or_else(invalid)
}

/// Parse a `name=value` strategy parameter given on the command line.
pub fn parse_param(text: &str) -> Result<(String, f64), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{text}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{text}'"));
    }
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("parameter '{key}' is not a number: '{}'", value.trim()))?;
    Ok((key.to_string(), value))
}
