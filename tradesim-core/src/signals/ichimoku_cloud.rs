//! Ichimoku cloud breakout.
//!
//! Buy when close is above both leading spans, sell when it is below both.
//!
//! With `lookahead` enabled the decision for bar t is taken from bar t+1's
//! close and spans, so the last bar can never signal. That reads one bar of
//! future data; turn it off for a causal strategy. Exit levels always come
//! from bar t's own close.

use crate::domain::{AnnotatedBar, Bar, Signal};
use crate::error::{ComputationError, ConfigError};
use crate::indicators::Ichimoku;

use super::{annotate, check_prices, invalid, ExitLevels, SignalGenerator, MAX_PERIOD};

const NAME: &str = "ichimoku";

#[derive(Debug, Clone)]
pub struct IchimokuCloud {
    pub ichimoku: Ichimoku,
    pub exits: ExitLevels,
    pub lookahead: bool,
}

impl IchimokuCloud {
    pub fn new(ichimoku: Ichimoku, exits: ExitLevels, lookahead: bool) -> Result<Self, ConfigError> {
        for (param, value) in [
            ("conversion_period", ichimoku.conversion_period),
            ("base_period", ichimoku.base_period),
            ("span_b_period", ichimoku.span_b_period),
        ] {
            if !(1..=MAX_PERIOD).contains(&value) {
                return Err(invalid(NAME, param, "must be in 1..=1000000"));
            }
        }
        if ichimoku.displacement > MAX_PERIOD {
            return Err(invalid(NAME, "displacement", "must be <= 1000000"));
        }
        Ok(Self {
            ichimoku,
            exits,
            lookahead,
        })
    }

    fn decide(close: f64, span_a: f64, span_b: f64) -> Signal {
        if close > span_a && close > span_b {
            Signal::Buy
        } else if close < span_a && close < span_b {
            Signal::Sell
        } else {
            Signal::None
        }
    }
}

impl SignalGenerator for IchimokuCloud {
    fn name(&self) -> &str {
        NAME
    }

    fn warmup_bars(&self) -> usize {
        self.ichimoku
            .cloud_lookback()
            .saturating_sub(usize::from(self.lookahead))
    }

    fn generate(&self, bars: &[Bar]) -> Result<Vec<AnnotatedBar>, ComputationError> {
        check_prices(bars)?;

        let lines = self.ichimoku.compute(bars);
        let offset = usize::from(self.lookahead);

        Ok(bars
            .iter()
            .enumerate()
            .map(|(t, bar)| {
                let src = t + offset;
                let signal = match bars.get(src) {
                    Some(source) => Self::decide(
                        source.close,
                        lines.leading_span_a[src],
                        lines.leading_span_b[src],
                    ),
                    None => Signal::None,
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

    fn small() -> Ichimoku {
        Ichimoku::new(3, 5, 8, 4)
    }

    fn ramp(n: usize, step: f64) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 200.0 + step * i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn rejects_shift_beyond_bound() {
        let shifted = Ichimoku::new(3, 5, 8, MAX_PERIOD + 1);
        assert!(IchimokuCloud::new(shifted, exits(), false).is_err());
        let wide = Ichimoku::new(3, 5, usize::MAX, 4);
        assert!(IchimokuCloud::new(wide, exits(), false).is_err());
    }

    #[test]
    fn causal_mode_buys_above_cloud() {
        let bars = ramp(20, 1.0);
        let gen = IchimokuCloud::new(small(), exits(), false).unwrap();
        let out = gen.generate(&bars).unwrap();
        // Both spans exist from bar 11 onwards.
        assert_eq!(out.iter().position(|ab| ab.signal == Signal::Buy), Some(11));
        assert!(out[11..].iter().all(|ab| ab.signal == Signal::Buy));
        assert_eq!(gen.warmup_bars(), 11);
    }

    #[test]
    fn lookahead_mode_reads_next_bar() {
        let bars = ramp(20, 1.0);
        let gen = IchimokuCloud::new(small(), exits(), true).unwrap();
        let out = gen.generate(&bars).unwrap();
        assert_eq!(out.iter().position(|ab| ab.signal == Signal::Buy), Some(10));
        assert_eq!(out[19].signal, Signal::None);
        assert_eq!(gen.warmup_bars(), 10);
    }

    #[test]
    fn exit_levels_use_own_close() {
        let bars = ramp(20, 1.0);
        let out = IchimokuCloud::new(small(), exits(), true)
            .unwrap()
            .generate(&bars)
            .unwrap();
        let close = bars[10].close;
        assert!((out[10].stop_loss.unwrap() - close * 0.98).abs() < 1e-9);
        assert!((out[10].take_profit.unwrap() - close * 1.05).abs() < 1e-9);
    }

    #[test]
    fn falling_prices_sell_below_cloud() {
        let bars = ramp(20, -1.0);
        let out = IchimokuCloud::new(small(), exits(), false)
            .unwrap()
            .generate(&bars)
            .unwrap();
        assert!(out[11..].iter().all(|ab| ab.signal == Signal::Sell));
        assert!(!out.iter().any(|ab| ab.signal == Signal::Buy));
    }

    #[test]
    fn too_short_for_cloud_is_silent() {
        let bars = ramp(8, 1.0);
        let out = IchimokuCloud::new(small(), exits(), true)
            .unwrap()
            .generate(&bars)
            .unwrap();
        assert!(out.iter().all(|ab| ab.signal == Signal::None));
    }

    #[test]
    fn rejects_zero_period() {
        let ichimoku = Ichimoku {
            conversion_period: 0,
            ..Ichimoku::default()
        };
        assert!(IchimokuCloud::new(ichimoku, exits(), true).is_err());
    }
}
