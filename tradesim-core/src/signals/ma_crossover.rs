//! Moving average crossover: golden cross buys, death cross sells.
//!
//! Buy when the short SMA crosses above the long SMA:
//! short[t] > long[t] and short[t-1] <= long[t-1].
//! Sell on the mirror-image cross below.

use crate::domain::{AnnotatedBar, Bar, Signal};
use crate::error::{ComputationError, ConfigError};
use crate::indicators::{Indicator, Sma};

use super::{annotate, check_prices, crossover, invalid, ExitLevels, SignalGenerator, MAX_PERIOD};

const NAME: &str = "ma_crossover";

#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short_window: usize,
    pub long_window: usize,
    pub exits: ExitLevels,
}

impl MaCrossover {
    pub fn new(
        short_window: usize,
        long_window: usize,
        exits: ExitLevels,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_PERIOD).contains(&short_window) {
            return Err(invalid(NAME, "short_window", "must be in 1..=1000000"));
        }
        if long_window <= short_window {
            return Err(invalid(NAME, "long_window", "must be > short_window"));
        }
        if long_window > MAX_PERIOD {
            return Err(invalid(NAME, "long_window", "must be <= 1000000"));
        }
        Ok(Self {
            short_window,
            long_window,
            exits,
        })
    }
}

impl SignalGenerator for MaCrossover {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_bars(&self) -> usize {
        // First valid long SMA is at long_window - 1; the cross needs one more bar.
        self.long_window
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<AnnotatedBar>, ComputationError> {
        check_prices(bars)?;

        let short = Sma::new(self.short_window).compute(bars);
        let long = Sma::new(self.long_window).compute(bars);

        Ok(bars
            .iter()
            .enumerate()
            .map(|(t, bar)| {
                let signal = if t == 0 {
                    Signal::None
                } else {
                    crossover(short[t - 1], long[t - 1], short[t], long[t])
                };
                annotate(bar, signal, Some(&self.exits))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn exits() -> ExitLevels {
        ExitLevels::new(NAME, 0.02, 0.05).unwrap()
    }

    fn signals(bars: &[Bar], short: usize, long: usize) -> Vec<Signal> {
        MaCrossover::new(short, long, exits())
            .unwrap()
            .generate(bars)
            .unwrap()
            .into_iter()
            .map(|ab| ab.signal)
            .collect()
    }

    #[test]
    fn fires_buy_on_golden_cross() {
        // Falling then sharply rising: SMA(2) crosses above SMA(4) at bar 5.
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 6.0, 12.0, 13.0, 14.0]);
        let sig = signals(&bars, 2, 4);
        let first_buy = sig.iter().position(|s| *s == Signal::Buy);
        assert_eq!(first_buy, Some(5));
        assert!(!sig.contains(&Signal::Sell));
    }

    #[test]
    fn fires_sell_on_death_cross() {
        let bars = make_bars(&[6.0, 7.0, 8.0, 9.0, 10.0, 4.0, 3.0, 2.0]);
        let sig = signals(&bars, 2, 4);
        assert_eq!(sig.iter().position(|s| *s == Signal::Sell), Some(5));
        assert!(!sig.contains(&Signal::Buy));
    }

    #[test]
    fn no_signal_when_trend_continues() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let sig = signals(&make_bars(&closes), 3, 7);
        assert!(sig.iter().all(|s| *s == Signal::None));
    }

    #[test]
    fn no_signal_during_warmup() {
        let bars = make_bars(&[10.0, 1.0, 20.0]);
        let sig = signals(&bars, 1, 3);
        assert!(sig.iter().all(|s| *s == Signal::None));
    }

    #[test]
    fn buy_bar_carries_exit_levels() {
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 6.0, 12.0, 13.0, 14.0]);
        let out = MaCrossover::new(2, 4, exits()).unwrap().generate(&bars).unwrap();
        let buy = &out[5];
        assert_eq!(buy.signal, Signal::Buy);
        assert!((buy.stop_loss.unwrap() - 12.0 * 0.98).abs() < 1e-12);
        assert!((buy.take_profit.unwrap() - 12.0 * 1.05).abs() < 1e-12);
        assert!(out[4].stop_loss.is_none());
    }

    #[test]
    fn output_preserves_bars() {
        let bars = make_bars(&[10.0, 9.0, 8.0, 7.0, 6.0, 9.0]);
        let out = MaCrossover::new(2, 4, exits()).unwrap().generate(&bars).unwrap();
        assert_eq!(out.len(), bars.len());
        for (ab, bar) in out.iter().zip(&bars) {
            assert_eq!(&ab.bar, bar);
        }
    }

    #[test]
    fn rejects_long_leq_short() {
        assert!(matches!(
            MaCrossover::new(21, 11, exits()),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn rejects_zero_short_window() {
        assert!(MaCrossover::new(0, 10, exits()).is_err());
    }

    #[test]
    fn rejects_nan_price() {
        let mut bars = make_bars(&[10.0, 9.0, 8.0]);
        bars[2].close = f64::NAN;
        let err = MaCrossover::new(1, 2, exits()).unwrap().generate(&bars).unwrap_err();
        assert!(matches!(err, ComputationError::NonFiniteValue { index: 2, .. }));
    }

    #[test]
    fn name_and_warmup() {
        let sig = MaCrossover::new(11, 21, exits()).unwrap();
        assert_eq!(sig.name(), "ma_crossover");
        assert_eq!(sig.warmup_bars(), 21);
    }
}
