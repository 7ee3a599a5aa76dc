//! Indicator implementations used by the signal generators.
//!
//! Indicators are pure functions: bar history in, numeric series out. Every
//! output series has the same length as its input, with `f64::NAN` during
//! warmup.

pub mod ichimoku;
pub mod midpoint;
pub mod roc;
pub mod rsi;
pub mod sma;

pub use ichimoku::{Ichimoku, IchimokuLines};
pub use midpoint::Midpoint;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// Trait for single-series indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of leading NaN values in the output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Shift a series by `offset` positions, filling vacated slots with NaN.
///
/// Positive offsets move values forward in time (value at t lands on
/// t + offset); negative offsets pull future values back.
pub fn shift(series: &[f64], offset: isize) -> Vec<f64> {
    let n = series.len();
    let mut out = vec![f64::NAN; n];
    for (i, slot) in out.iter_mut().enumerate() {
        let Some(src) = (i as isize).checked_sub(offset) else {
            continue;
        };
        if src >= 0 && (src as usize) < n {
            *slot = series[src as usize];
        }
    }
    out
}

/// Create synthetic bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open, close) + 1,
/// low = min(open, close) - 1, hourly timestamps.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2022, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_forward_pads_front() {
        let out = shift(&[1.0, 2.0, 3.0], 1);
        assert!(out[0].is_nan());
        assert_eq!(&out[1..], &[1.0, 2.0]);
    }

    #[test]
    fn extreme_offsets_do_not_overflow() {
        assert!(shift(&[1.0, 2.0, 3.0], isize::MAX).iter().all(|v| v.is_nan()));
        assert!(shift(&[1.0, 2.0, 3.0], -isize::MAX).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn shift_backward_pads_back() {
        let out = shift(&[1.0, 2.0, 3.0], -2);
        assert_eq!(out[0], 3.0);
        assert!(out[1].is_nan() && out[2].is_nan());
    }

    #[test]
    fn shift_beyond_length_is_all_nan() {
        assert!(shift(&[1.0, 2.0], 5).iter().all(|v| v.is_nan()));
    }
}
