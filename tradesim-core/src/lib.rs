//! TradeSim Core: domain types, indicators, strategies and the backtest engine.
//!
//! This crate contains:
//! - Domain types (bars, signals, positions, trade records)
//! - Indicators (SMA, RSI, ROC, midpoint, Ichimoku)
//! - Signal generators and the strategy factory
//! - The single-pass FLAT/LONG backtest engine and its report

pub mod domain;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod indicators;
pub mod signals;

pub use engine::{run_backtest, BacktestOutcome, EngineConfig, TradeReport};
pub use error::{BacktestError, ComputationError, ConfigError, InputError};
pub use fingerprint::StrategyConfig;
pub use signals::{create_strategy, SignalGenerator};
