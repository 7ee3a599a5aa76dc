//! Trade report and the performance arithmetic behind it.

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, TradeRecord};
use crate::error::{ensure_finite, ensure_positive_price, ComputationError};

/// Summary of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeReport {
    pub strategy_name: String,
    pub balance: f64,
    pub performance_pct: f64,
    pub hold_performance_pct: f64,
    pub total_fees: f64,
}

/// Everything a run produces. The caller decides what to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub report: TradeReport,
    pub ledger: Vec<TradeRecord>,
}

impl BacktestOutcome {
    pub fn trade_count(&self) -> usize {
        self.ledger.len()
    }
}

/// Realized return in percent.
pub fn performance_pct(final_balance: f64, initial_balance: f64) -> f64 {
    (final_balance / initial_balance - 1.0) * 100.0
}

/// Buy-and-hold return in percent from the first close to the last.
pub fn hold_performance(bars: &[AnnotatedBar]) -> Result<f64, ComputationError> {
    let (Some(first), Some(last)) = (bars.first(), bars.last()) else {
        return Ok(0.0);
    };
    let start = ensure_positive_price(first.bar.close, 0)?;
    let end = ensure_finite(last.bar.close, bars.len() - 1, "price")?;
    Ok((end / start - 1.0) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    fn annotated(closes: &[f64]) -> Vec<AnnotatedBar> {
        make_bars(closes).into_iter().map(AnnotatedBar::flat).collect()
    }

    #[test]
    fn performance_from_balances() {
        assert_approx(performance_pct(1050.0, 1000.0), 5.0, DEFAULT_EPSILON);
        assert_approx(performance_pct(900.0, 1000.0), -10.0, DEFAULT_EPSILON);
        assert_eq!(performance_pct(1000.0, 1000.0), 0.0);
    }

    #[test]
    fn hold_uses_first_and_last_close() {
        let bars = annotated(&[100.0, 50.0, 300.0, 110.0]);
        assert_approx(hold_performance(&bars).unwrap(), 10.0, 1e-9);
    }

    #[test]
    fn hold_rejects_zero_first_close() {
        let mut bars = annotated(&[100.0, 110.0]);
        bars[0].bar.close = 0.0;
        assert!(matches!(
            hold_performance(&bars),
            Err(ComputationError::NonPositivePrice { index: 0, .. })
        ));
    }
}
