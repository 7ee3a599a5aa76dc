//! RSI threshold: buy oversold, sell overbought.
//!
//! Level-triggered, not edge-triggered: every bar with RSI below `oversold`
//! is a buy bar and every bar above `overbought` is a sell bar.

use crate::domain::{AnnotatedBar, Bar, Signal};
use crate::error::{ComputationError, ConfigError};
use crate::indicators::{Indicator, Rsi};

use super::{annotate, check_prices, invalid, ExitLevels, SignalGenerator, MAX_PERIOD};

const NAME: &str = "rsi";

#[derive(Debug, Clone)]
pub struct RsiThreshold {
    pub period: usize,
    pub overbought: f64,
    pub oversold: f64,
    pub exits: ExitLevels,
}

impl RsiThreshold {
    pub fn new(
        period: usize,
        overbought: f64,
        oversold: f64,
        exits: ExitLevels,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_PERIOD).contains(&period) {
            return Err(invalid(NAME, "rsi_period", "must be in 1..=1000000"));
        }
        for (param, value) in [("overbought", overbought), ("oversold", oversold)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(invalid(NAME, param, "must be in [0, 100]"));
            }
        }
        if oversold >= overbought {
            return Err(invalid(NAME, "oversold", "must be below overbought"));
        }
        Ok(Self {
            period,
            overbought,
            oversold,
            exits,
        })
    }
}

impl SignalGenerator for RsiThreshold {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<AnnotatedBar>, ComputationError> {
        check_prices(bars)?;

        let rsi = Rsi::new(self.period).compute(bars);

        Ok(bars
            .iter()
            .zip(&rsi)
            .map(|(bar, &value)| {
                let signal = if value < self.oversold {
                    Signal::Buy
                } else if value > self.overbought {
                    Signal::Sell
                } else {
                    Signal::None
                };
                annotate(bar, signal, Some(&self.exits))
            })
            .collect())
    }
}
