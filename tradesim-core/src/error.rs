//! Error taxonomy for strategy construction, input validation, and the scan.
//!
//! Configuration and input errors are raised before the first bar is touched.
//! Computation errors abort a scan in progress; no partial report escapes.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised while building a strategy or validating engine settings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("strategy '{strategy}' requires parameter '{param}'")]
    MissingParameter { strategy: String, param: String },

    #[error("strategy '{strategy}': invalid parameter '{param}': {reason}")]
    InvalidParameter {
        strategy: String,
        param: String,
        reason: String,
    },

    #[error("invalid engine config: {0}")]
    InvalidEngineConfig(String),
}

/// Errors raised when the bar sequence cannot support a backtest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("bar sequence is empty")]
    Empty,

    #[error("need at least 2 bars, got {count}")]
    TooFewBars { count: usize },

    #[error("timestamp at bar {index} ({current}) is not after the previous one ({previous})")]
    NonIncreasingTimestamp {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },
}

/// Errors raised mid-computation instead of letting NaN/Inf leak into results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComputationError {
    #[error("non-positive price {price} at bar {index}")]
    NonPositivePrice { index: usize, price: f64 },

    #[error("non-finite {what} at bar {index}")]
    NonFiniteValue { index: usize, what: &'static str },
}

/// Any failure of a single backtest invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BacktestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("input error: {0}")]
    Input(#[from] InputError),

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),
}

/// Reject a value that would turn the scan into NaN/Inf soup.
pub(crate) fn ensure_finite(
    value: f64,
    index: usize,
    what: &'static str,
) -> Result<f64, ComputationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ComputationError::NonFiniteValue { index, what })
    }
}

/// Reject a price about to be used as a divisor.
pub(crate) fn ensure_positive_price(price: f64, index: usize) -> Result<f64, ComputationError> {
    if !price.is_finite() {
        return Err(ComputationError::NonFiniteValue {
            index,
            what: "price",
        });
    }
    if price <= 0.0 {
        return Err(ComputationError::NonPositivePrice { index, price });
    }
    Ok(price)
}
