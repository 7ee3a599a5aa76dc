//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses, seeded with the
//! simple mean of the first `period` changes.
//! RSI = 100 * avg_gain / (avg_gain + avg_loss)
//! Lookback: period.
//! Edge case: no movement at all (avg_gain + avg_loss == 0) yields 0, the
//! convention of the common TA libraries.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n <= self.period {
            return result;
        }

        let change = |i: usize| bars[i].close - bars[i - 1].close;

        let mut avg_gain = 0.0;
        let mut avg_loss = 0.0;
        for i in 1..=self.period {
            let ch = change(i);
            if ch.is_nan() {
                return result;
            }
            if ch > 0.0 {
                avg_gain += ch;
            } else {
                avg_loss -= ch;
            }
        }
        avg_gain /= self.period as f64;
        avg_loss /= self.period as f64;

        result[self.period] = compute_rsi(avg_gain, avg_loss);

        let period = self.period as f64;
        for i in (self.period + 1)..n {
            let ch = change(i);
            if ch.is_nan() {
                return result;
            }

            let gain = if ch > 0.0 { ch } else { 0.0 };
            let loss = if ch < 0.0 { -ch } else { 0.0 };

            avg_gain = (avg_gain * (period - 1.0) + gain) / period;
            avg_loss = (avg_loss * (period - 1.0) + loss) / period;

            result[i] = compute_rsi(avg_gain, avg_loss);
        }

        result
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * avg_gain / total
    }
}
