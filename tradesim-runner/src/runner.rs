//! Backtest runner: wires together data loading, the strategy factory and
//! the engine.
//!
//! Two entry points:
//! - `run_single_backtest()`: loads bars as the config describes, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes pre-loaded bars. Used by the optimizer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tradesim_core::domain::{Bar, TradeRecord};
use tradesim_core::engine::{run_backtest, EngineConfig, TradeReport};
use tradesim_core::error::{BacktestError, ConfigError as StrategyError};
use tradesim_core::fingerprint::StrategyConfig;
use tradesim_core::signals::create_strategy;

use crate::config::{BacktestConfig, ConfigError};
use crate::data_loader::{load_bars_csv, LoadError, LoadOptions};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
    #[error("backtest error: {0}")]
    Backtest(#[from] BacktestError),
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: StrategyConfig,
    /// BLAKE3 fingerprint of `strategy`.
    pub config_hash: String,
    pub engine: EngineConfig,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub bar_count: usize,
    pub warmup_bars: usize,
    pub report: TradeReport,
    pub ledger: Vec<TradeRecord>,
}

impl BacktestResult {
    pub fn trade_count(&self) -> usize {
        self.ledger.len()
    }
}

/// Load the bars a config points at, honouring its date window and interval.
pub fn load_config_bars(config: &BacktestConfig) -> Result<Vec<Bar>, RunError> {
    let opts = LoadOptions {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
        interval: config.interval()?,
    };
    Ok(load_bars_csv(&config.backtest.data, &opts)?)
}

/// Run a single backtest from a `BacktestConfig` (loads data from disk).
pub fn run_single_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let bars = load_config_bars(config)?;
    run_backtest_from_data(
        &config.strategy,
        &bars,
        &config.engine_config(),
        &config.backtest.symbol,
    )
}

/// Run a backtest with pre-loaded bars: no I/O.
pub fn run_backtest_from_data(
    strategy_config: &StrategyConfig,
    bars: &[Bar],
    engine: &EngineConfig,
    symbol: &str,
) -> Result<BacktestResult, RunError> {
    let strategy = create_strategy(strategy_config)?;
    let annotated = strategy.generate(bars).map_err(BacktestError::from)?;
    let outcome = run_backtest(&strategy_config.strategy_type, &annotated, engine)?;

    // run_backtest rejects fewer than two bars, so both ends exist.
    let (start, end) = (bars[0].timestamp, bars[bars.len() - 1].timestamp);

    Ok(BacktestResult {
        symbol: symbol.to_string(),
        strategy: strategy_config.clone(),
        config_hash: strategy_config.config_hash(),
        engine: *engine,
        start,
        end,
        bar_count: bars.len(),
        warmup_bars: strategy.warmup_bars(),
        report: outcome.report,
        ledger: outcome.ledger,
    })
}
