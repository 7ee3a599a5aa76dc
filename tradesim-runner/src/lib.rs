//! TradeSim Runner: backtest orchestration on top of `tradesim-core`.
//!
//! This crate provides:
//! - TOML run configuration
//! - CSV bar loading with date windows
//! - Single-backtest runner
//! - Parameter sweeps over `ma_crossover` and `roc`
//! - Ledger CSV and report JSON export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;
pub mod sweep;

pub use config::{BacktestConfig, ConfigError, OnError};
pub use data_loader::{load_bars_csv, read_bars_csv, LoadError, LoadOptions};
pub use export::{
    export_ledger_csv, export_report_json, format_summary, import_report_json, load_artifacts,
    save_artifacts,
};
pub use runner::{
    load_config_bars, run_backtest_from_data, run_single_backtest, BacktestResult, RunError,
};
pub use sweep::{run_sweep, ParamGrid, SweepError, SweepOptions, SweepOutcome};
