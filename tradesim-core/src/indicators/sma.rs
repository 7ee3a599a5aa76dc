//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
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

        let mut sum: f64 = bars.iter().take(self.period).map(|b| b.close).sum();
        result[self.period - 1] = sum / self.period as f64;

        for i in self.period..n {
            let leaving = bars[i - self.period].close;
            let entering = bars[i].close;
            if leaving.is_nan() || entering.is_nan() || sum.is_nan() {
                // Recompute so a NaN only poisons the windows that contain it.
                sum = bars[(i + 1 - self.period)..=i].iter().map(|b| b.close).sum();
            } else {
                sum = sum - leaving + entering;
            }
            result[i] = sum / self.period as f64;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for v in &result[..4] {
            assert!(v.is_nan());
        }
        assert_approx(result[4], 12.0, DEFAULT_EPSILON);
        assert_approx(result[5], 13.0, DEFAULT_EPSILON);
        assert_approx(result[6], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![100.0, 200.0, 300.0]);
    }

    #[test]
    fn sma_nan_propagation() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        bars[2].close = f64::NAN;
        let result = Sma::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert_approx(result[5], 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        assert!(Sma::new(5).compute(&bars).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(20).lookback(), 19);
        assert_eq!(Sma::new(1).lookback(), 0);
    }
}
