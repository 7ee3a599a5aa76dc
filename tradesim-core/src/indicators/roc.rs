//! Rate of Change (ROC).
//!
//! Percentage price change over N bars.
//! ROC[t] = (close[t] / close[t-period] - 1) * 100
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = bars[i - self.period].close;
            let curr = bars[i].close;
            if prev.is_nan() || curr.is_nan() || prev == 0.0 {
                continue;
            }
            result[i] = (curr / prev - 1.0) * 100.0;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn roc_basic() {
        let bars = make_bars(&[100.0, 110.0, 121.0]);
        let result = Roc::new(1).compute(&bars);

        assert!(result[0].is_nan());
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn roc_period_2() {
        let bars = make_bars(&[100.0, 110.0, 121.0]);
        let result = Roc::new(2).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], 21.0, DEFAULT_EPSILON);
    }

    #[test]
    fn roc_negative() {
        let bars = make_bars(&[100.0, 90.0]);
        assert_approx(Roc::new(1).compute(&bars)[1], -10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn roc_zero_base_is_nan() {
        let bars = make_bars(&[0.0, 90.0]);
        assert!(Roc::new(1).compute(&bars)[1].is_nan());
    }
}
