//! Ichimoku Kinko Hyo: five derived lines.
//!
//! - Conversion (tenkan): midpoint over `conversion_period`
//! - Base (kijun): midpoint over `base_period`
//! - Leading span A: (conversion + base) / 2, shifted forward `displacement` bars
//! - Leading span B: midpoint over `span_b_period`, shifted forward `displacement` bars
//! - Lagging span (chikou): close shifted back `displacement` bars
//!
//! The leading spans at bar t only use data up to t - displacement. The lagging
//! span is the one line that reads future closes; it exists for charting and is
//! never consulted by the signal generator.

use serde::{Deserialize, Serialize};

use super::{shift, Indicator, Midpoint};
use crate::domain::Bar;

/// All five Ichimoku series, each the same length as the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IchimokuLines {
    pub conversion: Vec<f64>,
    pub base: Vec<f64>,
    pub leading_span_a: Vec<f64>,
    pub leading_span_b: Vec<f64>,
    pub lagging_span: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ichimoku {
    pub conversion_period: usize,
    pub base_period: usize,
    pub span_b_period: usize,
    pub displacement: usize,
}

impl Default for Ichimoku {
    fn default() -> Self {
        Self {
            conversion_period: 9,
            base_period: 26,
            span_b_period: 52,
            displacement: 26,
        }
    }
}

impl Ichimoku {
    pub fn new(
        conversion_period: usize,
        base_period: usize,
        span_b_period: usize,
        displacement: usize,
    ) -> Self {
        assert!(conversion_period >= 1, "conversion_period must be >= 1");
        assert!(base_period >= 1, "base_period must be >= 1");
        assert!(span_b_period >= 1, "span_b_period must be >= 1");
        Self {
            conversion_period,
            base_period,
            span_b_period,
            displacement,
        }
    }

    /// Number of leading bars where both leading spans are NaN.
    pub fn cloud_lookback(&self) -> usize {
        (self.base_period.max(self.conversion_period).max(self.span_b_period) - 1)
            .saturating_add(self.displacement)
    }

    pub fn compute(&self, bars: &[Bar]) -> IchimokuLines {
        let conversion = Midpoint::new(self.conversion_period).compute(bars);
        let base = Midpoint::new(self.base_period).compute(bars);
        let span_b_raw = Midpoint::new(self.span_b_period).compute(bars);

        let span_a_raw: Vec<f64> = conversion
            .iter()
            .zip(&base)
            .map(|(c, b)| (c + b) / 2.0)
            .collect();

        let displacement = isize::try_from(self.displacement).unwrap_or(isize::MAX);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        IchimokuLines {
            leading_span_a: shift(&span_a_raw, displacement),
            leading_span_b: shift(&span_b_raw, displacement),
            lagging_span: shift(&closes, -displacement),
            conversion,
            base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn ramp(n: usize) -> Vec<Bar> {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        make_bars(&closes)
    }

    #[test]
    fn lines_have_input_length() {
        let bars = ramp(40);
        let lines = Ichimoku::new(3, 5, 8, 4).compute(&bars);
        assert_eq!(lines.conversion.len(), 40);
        assert_eq!(lines.base.len(), 40);
        assert_eq!(lines.leading_span_a.len(), 40);
        assert_eq!(lines.leading_span_b.len(), 40);
        assert_eq!(lines.lagging_span.len(), 40);
    }

    #[test]
    fn leading_spans_are_displaced_forward() {
        let bars = ramp(40);
        let ichi = Ichimoku::new(3, 5, 8, 4);
        let lines = ichi.compute(&bars);

        let conversion = Midpoint::new(3).compute(&bars);
        let base = Midpoint::new(5).compute(&bars);
        let span_b = Midpoint::new(8).compute(&bars);

        for t in 20..40 {
            assert_approx(
                lines.leading_span_a[t],
                (conversion[t - 4] + base[t - 4]) / 2.0,
                DEFAULT_EPSILON,
            );
            assert_approx(lines.leading_span_b[t], span_b[t - 4], DEFAULT_EPSILON);
        }
    }

    #[test]
    fn cloud_warmup_is_nan() {
        let bars = ramp(40);
        let ichi = Ichimoku::new(3, 5, 8, 4);
        let lines = ichi.compute(&bars);
        let lookback = ichi.cloud_lookback();
        assert_eq!(lookback, 11);
        assert!(lines.leading_span_b[..lookback].iter().all(|v| v.is_nan()));
        assert!(!lines.leading_span_b[lookback].is_nan());
    }

    #[test]
    fn lagging_span_reads_future_close() {
        let bars = ramp(10);
        let lines = Ichimoku::new(2, 3, 4, 3).compute(&bars);
        assert_eq!(lines.lagging_span[0], bars[3].close);
        assert!(lines.lagging_span[7].is_nan());
    }

    #[test]
    fn defaults_are_classic_periods() {
        let ichi = Ichimoku::default();
        assert_eq!(
            (ichi.conversion_period, ichi.base_period, ichi.span_b_period, ichi.displacement),
            (9, 26, 52, 26)
        );
    }
}
