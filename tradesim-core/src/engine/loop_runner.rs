//! The single forward scan over an annotated bar sequence.
//!
//! Per bar, exactly one of:
//! - LONG: evaluate exits (stop-loss, take-profit, sell signal) in that order.
//!   A buy signal while LONG is ignored.
//! - FLAT: a buy signal opens a position at the bar's close.
//!
//! After the last bar an open position is liquidated at the final close,
//! without fee and without a ledger entry.

use tracing::{debug, info};

use crate::domain::{AnnotatedBar, Signal};
use crate::error::BacktestError;

use super::report::{hold_performance, performance_pct, BacktestOutcome, TradeReport};
use super::state::{EngineConfig, EngineState};
use super::validate::validate_bars;

/// Run a backtest over bars that a signal generator has already annotated.
///
/// Config and input are validated before the first bar is touched. A
/// computation error mid-scan aborts the run; no partial outcome is returned.
pub fn run_backtest(
    strategy_name: &str,
    bars: &[AnnotatedBar],
    config: &EngineConfig,
) -> Result<BacktestOutcome, BacktestError> {
    config.validate()?;
    validate_bars(bars)?;

    let fee_rate = config.taker_fee;
    let mut state = EngineState::new(config.initial_balance);

    for (index, ab) in bars.iter().enumerate() {
        if state.is_long() {
            if let Some(reason) = state.exit_reason(ab) {
                state.close(index, ab, reason, fee_rate)?;
                debug!(
                    index,
                    price = ab.bar.close,
                    %reason,
                    balance = state.balance,
                    "sell"
                );
            }
        } else if ab.signal == Signal::Buy {
            state.open(index, ab, fee_rate)?;
            debug!(
                index,
                price = ab.bar.close,
                stop_loss = ?ab.stop_loss,
                take_profit = ?ab.take_profit,
                "buy"
            );
        }
    }

    let last_index = bars.len() - 1;
    if state.is_long() {
        let last_close = bars[last_index].bar.close;
        state.liquidate(last_index, last_close)?;
        debug!(price = last_close, balance = state.balance, "end-of-data liquidation");
    }

    let report = TradeReport {
        strategy_name: strategy_name.to_string(),
        balance: state.balance,
        performance_pct: performance_pct(state.balance, config.initial_balance),
        hold_performance_pct: hold_performance(bars)?,
        total_fees: state.total_fees,
    };

    info!(
        strategy = strategy_name,
        bars = bars.len(),
        trades = state.ledger.len(),
        balance = report.balance,
        performance_pct = report.performance_pct,
        "backtest complete"
    );

    Ok(BacktestOutcome {
        report,
        ledger: state.ledger,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExitReason;
    use crate::error::{ComputationError, InputError};
    use crate::indicators::make_bars;

    fn annotated(closes: &[f64]) -> Vec<AnnotatedBar> {
        make_bars(closes).into_iter().map(AnnotatedBar::flat).collect()
    }

    #[test]
    fn reference_scenario() {
        let mut bars = annotated(&[100.0, 105.0, 102.0, 98.0, 110.0]);
        bars[0].signal = Signal::Buy;
        bars[0].stop_loss = Some(98.0);
        bars[0].take_profit = Some(105.0);

        let outcome = run_backtest("ma_crossover", &bars, &EngineConfig::default()).unwrap();
        assert_eq!(outcome.ledger.len(), 2);
        assert_eq!(outcome.ledger[1].reason, Some(ExitReason::TakeProfit));
        assert_eq!(outcome.ledger[1].bar_index, 1);
        assert!((outcome.report.balance - 1050.0).abs() < 1e-9);
        assert!((outcome.report.performance_pct - 5.0).abs() < 1e-9);
        assert!((outcome.report.hold_performance_pct - 10.0).abs() < 1e-9);
        assert_eq!(outcome.report.total_fees, 0.0);
    }

    #[test]
    fn buy_while_long_is_ignored() {
        let mut bars = annotated(&[100.0, 110.0, 120.0]);
        bars[0].signal = Signal::Buy;
        bars[1].signal = Signal::Buy;
        let outcome = run_backtest("x", &bars, &EngineConfig::default()).unwrap();
        assert_eq!(outcome.ledger.len(), 1);
        assert!((outcome.report.balance - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn reenters_on_a_later_buy() {
        let mut bars = annotated(&[100.0, 110.0, 120.0, 130.0]);
        bars[0].signal = Signal::Buy;
        bars[1].signal = Signal::Sell;
        bars[2].signal = Signal::Buy;
        let outcome = run_backtest("x", &bars, &EngineConfig::default()).unwrap();
        let indices: Vec<usize> = outcome.ledger.iter().map(|t| t.bar_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn entry_bar_is_not_checked_for_exit() {
        // Entry bar's own low is below the stop; only later bars count.
        let mut bars = annotated(&[100.0, 100.5, 101.0]);
        bars[0].signal = Signal::Buy;
        bars[0].stop_loss = Some(99.5);
        let outcome = run_backtest("x", &bars, &EngineConfig::default()).unwrap();
        assert_eq!(outcome.ledger[1].bar_index, 1);
        assert_eq!(outcome.ledger[1].reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn invalid_config_rejected_first() {
        let bars = annotated(&[100.0]);
        let err = run_backtest("x", &bars, &EngineConfig::new(-1.0, 0.0)).unwrap_err();
        assert!(matches!(err, BacktestError::Config(_)));
    }

    #[test]
    fn single_bar_rejected() {
        let err = run_backtest("x", &annotated(&[100.0]), &EngineConfig::default()).unwrap_err();
        assert_eq!(err, BacktestError::Input(InputError::TooFewBars { count: 1 }));
    }

    #[test]
    fn zero_price_buy_aborts() {
        let mut bars = annotated(&[100.0, 0.0, 100.0]);
        bars[1].signal = Signal::Buy;
        let err = run_backtest("x", &bars, &EngineConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            BacktestError::Computation(ComputationError::NonPositivePrice { index: 1, .. })
        ));
    }
}
