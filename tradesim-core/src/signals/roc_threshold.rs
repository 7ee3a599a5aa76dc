//! Rate-of-change threshold crossings.
//!
//! Buy when ROC crosses above `+threshold`, sell when it crosses below
//! `-threshold`. Exit levels are optional: without them only a sell signal
//! or the end of data closes a position.

use crate::domain::{AnnotatedBar, Bar, Signal};
use crate::error::{ensure_positive_price, ComputationError, ConfigError};
use crate::indicators::{Indicator, Roc};

use super::{annotate, check_prices, invalid, ExitLevels, SignalGenerator, MAX_PERIOD};

const NAME: &str = "roc";

#[derive(Debug, Clone)]
pub struct RocThreshold {
    pub period: usize,
    pub threshold: f64,
    pub exits: Option<ExitLevels>,
}

impl RocThreshold {
    pub fn new(
        period: usize,
        threshold: f64,
        exits: Option<ExitLevels>,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_PERIOD).contains(&period) {
            return Err(invalid(NAME, "roc_period", "must be in 1..=1000000"));
        }
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(invalid(NAME, "roc_threshold", "must be finite and >= 0"));
        }
        Ok(Self {
            period,
            threshold,
            exits,
        })
    }
}

impl SignalGenerator for RocThreshold {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_bars(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<AnnotatedBar>, ComputationError> {
        check_prices(bars)?;
        // Every close that ends up as a ROC denominator.
        let divisors = bars.len().saturating_sub(self.period);
        for (i, bar) in bars.iter().take(divisors).enumerate() {
            ensure_positive_price(bar.close, i)?;
        }

        let roc = Roc::new(self.period).compute(bars);
        let upper = self.threshold;
        let lower = -self.threshold;

        Ok(bars
            .iter()
            .enumerate()
            .map(|(t, bar)| {
                let signal = if t == 0 {
                    Signal::None
                } else {
                    let (prev, curr) = (roc[t - 1], roc[t]);
                    if curr > upper && prev <= upper {
                        Signal::Buy
                    } else if curr < lower && prev >= lower {
                        Signal::Sell
                    } else {
                        Signal::None
                    }
                };
                annotate(bar, signal, self.exits.as_ref())
            })
            .collect())
    }
}
