//! Strategy factory: `StrategyConfig` → boxed `SignalGenerator`.
//!
//! All parameter validation happens here or in the generator constructors,
//! so a strategy that builds is a strategy that can run.

use crate::error::ConfigError;
use crate::fingerprint::StrategyConfig;
use crate::indicators::Ichimoku;

use super::{
    invalid, ExitLevels, IchimokuCloud, MaCrossover, RocThreshold, RsiThreshold, SignalGenerator,
    MAX_PERIOD,
};

/// Every strategy identifier the factory understands.
pub const STRATEGY_TYPES: &[&str] = &["ma_crossover", "rsi", "ichimoku", "roc"];

// ─── Helpers ─────────────────────────────────────────────────────────

fn required(config: &StrategyConfig, name: &str) -> Result<f64, ConfigError> {
    let value = config
        .param(name)
        .ok_or_else(|| ConfigError::MissingParameter {
            strategy: config.strategy_type.clone(),
            param: name.to_string(),
        })?;
    if !value.is_finite() {
        return Err(invalid(&config.strategy_type, name, "must be finite"));
    }
    Ok(value)
}

/// Whole number in `min..=MAX_PERIOD`.
fn to_whole(
    config: &StrategyConfig,
    name: &str,
    value: f64,
    min: usize,
) -> Result<usize, ConfigError> {
    if !value.is_finite()
        || value.fract() != 0.0
        || value < min as f64
        || value > MAX_PERIOD as f64
    {
        return Err(invalid(
            &config.strategy_type,
            name,
            &format!("must be a whole number in {min}..={MAX_PERIOD}"),
        ));
    }
    Ok(value as usize)
}

/// Integer-valued parameter, at least 1.
fn to_period(config: &StrategyConfig, name: &str, value: f64) -> Result<usize, ConfigError> {
    to_whole(config, name, value, 1)
}

fn required_period(config: &StrategyConfig, name: &str) -> Result<usize, ConfigError> {
    let value = required(config, name)?;
    to_period(config, name, value)
}

fn period_or(config: &StrategyConfig, name: &str, default: usize) -> Result<usize, ConfigError> {
    match config.param(name) {
        Some(value) => to_period(config, name, value),
        None => Ok(default),
    }
}

fn required_exits(config: &StrategyConfig) -> Result<ExitLevels, ConfigError> {
    ExitLevels::new(
        &config.strategy_type,
        required(config, "stop_loss_pct")?,
        required(config, "take_profit_pct")?,
    )
}

/// Both exit params or neither.
fn optional_exits(config: &StrategyConfig) -> Result<Option<ExitLevels>, ConfigError> {
    match (config.param("stop_loss_pct"), config.param("take_profit_pct")) {
        (None, None) => Ok(None),
        (Some(_), Some(_)) => required_exits(config).map(Some),
        (Some(_), None) => Err(ConfigError::MissingParameter {
            strategy: config.strategy_type.clone(),
            param: "take_profit_pct".into(),
        }),
        (None, Some(_)) => Err(ConfigError::MissingParameter {
            strategy: config.strategy_type.clone(),
            param: "stop_loss_pct".into(),
        }),
    }
}

// ─── Factory ─────────────────────────────────────────────────────────

/// Build a signal generator from its configuration.
pub fn create_strategy(config: &StrategyConfig) -> Result<Box<dyn SignalGenerator>, ConfigError> {
    match config.strategy_type.as_str() {
        "ma_crossover" => {
            let short = required_period(config, "short_window")?;
            let long = required_period(config, "long_window")?;
            let exits = required_exits(config)?;
            Ok(Box::new(MaCrossover::new(short, long, exits)?))
        }
        "rsi" => {
            let period = required_period(config, "rsi_period")?;
            let overbought = required(config, "overbought")?;
            let oversold = required(config, "oversold")?;
            let exits = required_exits(config)?;
            Ok(Box::new(RsiThreshold::new(period, overbought, oversold, exits)?))
        }
        "ichimoku" => {
            let defaults = Ichimoku::default();
            let ichimoku = Ichimoku {
                conversion_period: period_or(config, "conversion_period", defaults.conversion_period)?,
                base_period: period_or(config, "base_period", defaults.base_period)?,
                span_b_period: period_or(config, "span_b_period", defaults.span_b_period)?,
                displacement: match config.param("displacement") {
                    Some(d) => to_whole(config, "displacement", d, 0)?,
                    None => defaults.displacement,
                },
            };
            let lookahead = match config.param("lookahead") {
                None => true,
                Some(v) if v == 1.0 => true,
                Some(v) if v == 0.0 => false,
                Some(_) => {
                    return Err(invalid(&config.strategy_type, "lookahead", "must be 0 or 1"))
                }
            };
            let exits = required_exits(config)?;
            Ok(Box::new(IchimokuCloud::new(ichimoku, exits, lookahead)?))
        }
        "roc" => {
            let period = required_period(config, "roc_period")?;
            let threshold = required(config, "roc_threshold")?;
            let exits = optional_exits(config)?;
            Ok(Box::new(RocThreshold::new(period, threshold, exits)?))
        }
        other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
