//! Parameter sweep: exhaustive grid search for the highest final balance.
//!
//! Each combination gets its own generator and engine state; the bar slice
//! is shared read-only. Results are collected in grid order and the winner
//! is picked sequentially with a strict `>`, so ties go to the earliest
//! combination regardless of thread scheduling.

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use tradesim_core::domain::Bar;
use tradesim_core::engine::EngineConfig;
use tradesim_core::fingerprint::StrategyConfig;

use crate::config::OnError;
use crate::runner::{run_backtest_from_data, BacktestResult, RunError};

/// Errors from a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("strategy '{0}' has no search space (supported: ma_crossover, roc)")]
    UnsupportedStrategy(String),

    #[error("ma_crossover optimization needs stop_loss_pct and take_profit_pct")]
    MissingExitLevels,

    #[error("combination {config} failed: {source}")]
    Run {
        config: String,
        #[source]
        source: RunError,
    },

    #[error("every combination failed")]
    NoResults,
}

/// The ordered list of strategy configurations to evaluate.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    configs: Vec<StrategyConfig>,
}

impl ParamGrid {
    /// Search space for a strategy type.
    ///
    /// `exits` is the fixed (stop_loss_pct, take_profit_pct) pair added to
    /// every combination. It is required for `ma_crossover` and optional for
    /// `roc`.
    pub fn for_strategy(strategy_type: &str, exits: Option<(f64, f64)>) -> Result<Self, SweepError> {
        match strategy_type {
            "ma_crossover" => {
                let (sl, tp) = exits.ok_or(SweepError::MissingExitLevels)?;
                Ok(Self::ma_crossover(sl, tp))
            }
            "roc" => Ok(Self::roc(exits)),
            other => Err(SweepError::UnsupportedStrategy(other.to_string())),
        }
    }

    /// Short window 5..=20 × long window 21..=50.
    pub fn ma_crossover(stop_loss_pct: f64, take_profit_pct: f64) -> Self {
        let mut configs = Vec::with_capacity(16 * 30);
        for short in 5..=20 {
            for long in 21..=50 {
                configs.push(
                    StrategyConfig::new("ma_crossover")
                        .with_param("short_window", short as f64)
                        .with_param("long_window", long as f64)
                        .with_param("stop_loss_pct", stop_loss_pct)
                        .with_param("take_profit_pct", take_profit_pct),
                );
            }
        }
        Self { configs }
    }

    /// Period 5..=20 × threshold 1.0..=3.0 in steps of 0.1.
    pub fn roc(exits: Option<(f64, f64)>) -> Self {
        let mut configs = Vec::with_capacity(16 * 21);
        for period in 5..=20 {
            for tenths in 10..=30 {
                let mut config = StrategyConfig::new("roc")
                    .with_param("roc_period", period as f64)
                    .with_param("roc_threshold", tenths as f64 / 10.0);
                if let Some((sl, tp)) = exits {
                    config = config
                        .with_param("stop_loss_pct", sl)
                        .with_param("take_profit_pct", tp);
                }
                configs.push(config);
            }
        }
        Self { configs }
    }

    /// A grid over an explicit list of configurations.
    pub fn from_configs(configs: Vec<StrategyConfig>) -> Self {
        Self { configs }
    }

    pub fn size(&self) -> usize {
        self.configs.len()
    }

    pub fn configs(&self) -> &[StrategyConfig] {
        &self.configs
    }
}

/// How a sweep executes.
#[derive(Debug, Clone, Copy)]
pub struct SweepOptions {
    pub parallel: bool,
    pub on_error: OnError,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            on_error: OnError::Abort,
        }
    }
}

/// The winning combination plus bookkeeping.
#[derive(Debug, Clone)]
pub struct SweepOutcome {
    pub best_config: StrategyConfig,
    pub best: BacktestResult,
    /// Combinations that produced a result.
    pub evaluated: usize,
    /// Combinations that failed and were skipped.
    pub skipped: usize,
}

/// Evaluate every combination in `grid` and return the highest final balance.
pub fn run_sweep(
    grid: &ParamGrid,
    bars: &[Bar],
    engine: &EngineConfig,
    symbol: &str,
    opts: &SweepOptions,
) -> Result<SweepOutcome, SweepError> {
    let evaluate = |config: &StrategyConfig| run_backtest_from_data(config, bars, engine, symbol);

    let results: Vec<Result<BacktestResult, RunError>> = if opts.parallel {
        grid.configs.par_iter().map(evaluate).collect()
    } else {
        grid.configs.iter().map(evaluate).collect()
    };

    let mut best: Option<BacktestResult> = None;
    let mut evaluated = 0;
    let mut skipped = 0;

    for (config, result) in grid.configs.iter().zip(results) {
        match result {
            Ok(result) => {
                evaluated += 1;
                let better = best
                    .as_ref()
                    .map_or(true, |b| result.report.balance > b.report.balance);
                if better {
                    best = Some(result);
                }
            }
            Err(source) => match opts.on_error {
                OnError::Abort => {
                    return Err(SweepError::Run {
                        config: config.describe(),
                        source,
                    })
                }
                OnError::Skip => {
                    warn!(config = %config.describe(), error = %source, "skipping combination");
                    skipped += 1;
                }
            },
        }
    }

    let best = best.ok_or(SweepError::NoResults)?;
    info!(
        best = %best.strategy.describe(),
        balance = best.report.balance,
        evaluated,
        skipped,
        "sweep complete"
    );
    Ok(SweepOutcome {
        best_config: best.strategy.clone(),
        best,
        evaluated,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ma_grid_shape() {
        let grid = ParamGrid::ma_crossover(0.03, 0.06);
        assert_eq!(grid.size(), 16 * 30);
        let first = &grid.configs()[0];
        assert_eq!(first.param("short_window"), Some(5.0));
        assert_eq!(first.param("long_window"), Some(21.0));
        assert_eq!(first.param("stop_loss_pct"), Some(0.03));
        let last = &grid.configs()[grid.size() - 1];
        assert_eq!(last.param("short_window"), Some(20.0));
        assert_eq!(last.param("long_window"), Some(50.0));
    }

    #[test]
    fn roc_grid_shape() {
        let grid = ParamGrid::roc(None);
        assert_eq!(grid.size(), 16 * 21);
        let thresholds: Vec<f64> = grid.configs()[..21]
            .iter()
            .filter_map(|c| c.param("roc_threshold"))
            .collect();
        assert_eq!(thresholds[0], 1.0);
        assert_eq!(thresholds[5], 1.5);
        assert_eq!(thresholds[20], 3.0);
        assert!(grid.configs()[0].param("stop_loss_pct").is_none());
    }

    #[test]
    fn unsupported_strategies() {
        assert!(matches!(
            ParamGrid::for_strategy("rsi", Some((0.02, 0.05))),
            Err(SweepError::UnsupportedStrategy(_))
        ));
        assert!(matches!(
            ParamGrid::for_strategy("ma_crossover", None),
            Err(SweepError::MissingExitLevels)
        ));
        assert!(ParamGrid::for_strategy("roc", None).is_ok());
    }
}
