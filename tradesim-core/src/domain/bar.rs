//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument over one fixed interval.
///
/// Timestamps mark the bar open and must be strictly increasing across a
/// sequence. Volume is fractional since crypto venues report base-asset size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Returns true if any price field is NaN or infinite.
    pub fn has_non_finite_price(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.has_non_finite_price() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
            && self.volume >= 0.0
    }
}
