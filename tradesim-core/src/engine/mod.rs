//! Backtest engine: a two-state (FLAT/LONG) machine driven by annotated bars.
//!
//! The engine never computes indicators and never performs I/O. It consumes
//! a signal generator's output and returns a `BacktestOutcome`; persisting it
//! is the caller's business.

pub mod loop_runner;
pub mod report;
pub mod state;
pub mod validate;

pub use loop_runner::run_backtest;
pub use report::{hold_performance, performance_pct, BacktestOutcome, TradeReport};
pub use state::{EngineConfig, EngineState};
pub use validate::validate_bars;
