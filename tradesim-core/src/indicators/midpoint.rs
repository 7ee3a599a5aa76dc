//! Rolling midpoint: (highest high + lowest low) / 2 over a lookback window.
//!
//! This is the building block of every Ichimoku line.
//! Lookback: period - 1.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Midpoint {
    period: usize,
    name: String,
}

impl Midpoint {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Midpoint period must be >= 1");
        Self {
            period,
            name: format!("midpoint_{period}"),
        }
    }
}

impl Indicator for Midpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[(i + 1 - self.period)..=i];
            if window.iter().any(|b| b.high.is_nan() || b.low.is_nan()) {
                continue;
            }
            let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            result[i] = (highest + lowest) / 2.0;
        }

        result
    }
}
