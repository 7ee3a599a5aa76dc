//! Signal generation: turns a bar sequence into an annotated sequence.
//!
//! Generators are engine-agnostic: they see bars and their own parameters,
//! never balance or position state. Each one emits exactly one
//! `AnnotatedBar` per input bar, in order, and leaves the bar itself untouched.

pub mod factory;
pub mod ichimoku_cloud;
pub mod ma_crossover;
pub mod roc_threshold;
pub mod rsi_threshold;

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, Bar, Signal};
use crate::error::{ComputationError, ConfigError};

pub use factory::{create_strategy, STRATEGY_TYPES};
pub use ichimoku_cloud::IchimokuCloud;
pub use ma_crossover::MaCrossover;
pub use roc_threshold::RocThreshold;
pub use rsi_threshold::RsiThreshold;

/// Trait for signal generators.
///
/// # Architecture invariant
/// `generate` receives only the bar sequence. If an implementation needs
/// engine state, it belongs in the engine, not here.
pub trait SignalGenerator: Send + Sync {
    /// Strategy identifier (e.g., "ma_crossover").
    fn name(&self) -> &str;

    /// Number of leading bars that can never carry a signal.
    fn warmup_bars(&self) -> usize;

    /// Annotate every bar with a signal and, on buy bars, exit levels.
    fn generate(&self, bars: &[Bar]) -> Result<Vec<AnnotatedBar>, ComputationError>;
}

/// Fractional stop-loss / take-profit offsets applied to a buy bar's close.
///
/// `stop_loss_pct = 0.02` puts the stop 2% under the entry close;
/// `take_profit_pct = 0.05` puts the target 5% above it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitLevels {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl ExitLevels {
    pub fn new(
        strategy: &str,
        stop_loss_pct: f64,
        take_profit_pct: f64,
    ) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&stop_loss_pct) {
            return Err(invalid(strategy, "stop_loss_pct", "must be in [0, 1)"));
        }
        if !(take_profit_pct.is_finite() && take_profit_pct >= 0.0) {
            return Err(invalid(strategy, "take_profit_pct", "must be finite and >= 0"));
        }
        Ok(Self {
            stop_loss_pct,
            take_profit_pct,
        })
    }

    pub fn stop_loss(&self, close: f64) -> f64 {
        close * (1.0 - self.stop_loss_pct)
    }

    pub fn take_profit(&self, close: f64) -> f64 {
        close * (1.0 + self.take_profit_pct)
    }
}

/// Build the annotated bar for one position in the sequence.
///
/// Exit levels are only attached to buy bars.
pub(crate) fn annotate(bar: &Bar, signal: Signal, exits: Option<&ExitLevels>) -> AnnotatedBar {
    let (stop_loss, take_profit) = match (signal, exits) {
        (Signal::Buy, Some(levels)) => (
            Some(levels.stop_loss(bar.close)),
            Some(levels.take_profit(bar.close)),
        ),
        _ => (None, None),
    };
    AnnotatedBar {
        bar: bar.clone(),
        signal,
        stop_loss,
        take_profit,
    }
}

/// Reject NaN/Inf prices before any indicator sees them.
pub(crate) fn check_prices(bars: &[Bar]) -> Result<(), ComputationError> {
    match bars.iter().position(Bar::has_non_finite_price) {
        Some(index) => Err(ComputationError::NonFiniteValue {
            index,
            what: "price",
        }),
        None => Ok(()),
    }
}

/// Crossover of two series between bar t-1 and bar t.
///
/// NaN on either side (warmup) compares false and yields no signal.
pub(crate) fn crossover(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> Signal {
    if fast > slow && prev_fast <= prev_slow {
        Signal::Buy
    } else if fast < slow && prev_fast >= prev_slow {
        Signal::Sell
    } else {
        Signal::None
    }
}

/// Upper bound for window lengths and shifts. Keeps lookback sums far from
/// `usize` overflow and shifts representable as `isize`.
pub const MAX_PERIOD: usize = 1_000_000;

pub(crate) fn invalid(strategy: &str, param: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        strategy: strategy.to_string(),
        param: param.to_string(),
        reason: reason.to_string(),
    }
}
