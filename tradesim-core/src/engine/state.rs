//! Engine configuration and the mutable state carried through the scan.

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, ExitReason, Position, Signal, TradeAction, TradeRecord};
use crate::error::{ensure_finite, ensure_positive_price, ComputationError, ConfigError};

/// Settings for a single backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_balance: f64,
    /// Proportional fee charged on every simulated fill, e.g. 0.001 for 0.1%.
    pub taker_fee: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            taker_fee: 0.0,
        }
    }
}

impl EngineConfig {
    pub fn new(initial_balance: f64, taker_fee: f64) -> Self {
        Self {
            initial_balance,
            taker_fee,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(ConfigError::InvalidEngineConfig(format!(
                "initial_balance must be finite and > 0, got {}",
                self.initial_balance
            )));
        }
        if !(0.0..=1.0).contains(&self.taker_fee) {
            return Err(ConfigError::InvalidEngineConfig(format!(
                "taker_fee must be in [0, 1], got {}",
                self.taker_fee
            )));
        }
        Ok(())
    }
}

/// FLAT when `position` is `None`, LONG otherwise.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub balance: f64,
    pub position: Option<Position>,
    pub total_fees: f64,
    pub ledger: Vec<TradeRecord>,
}

impl EngineState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            position: None,
            total_fees: 0.0,
            ledger: Vec::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        self.position.is_some()
    }

    /// FLAT → LONG at the bar's close, spending the whole balance.
    ///
    /// The fee is `balance / price * fee_rate`, and it is taken out of the
    /// balance before conversion.
    pub fn open(
        &mut self,
        index: usize,
        ab: &AnnotatedBar,
        fee_rate: f64,
    ) -> Result<(), ComputationError> {
        let price = ensure_positive_price(ab.bar.close, index)?;
        let fee = ensure_finite(self.balance / price * fee_rate, index, "fee")?;
        let amount = ensure_finite((self.balance - fee) / price, index, "position")?;

        self.balance = 0.0;
        self.total_fees += fee;
        self.position = Some(Position {
            amount,
            entry_index: index,
            entry_price: price,
            stop_loss: ab.stop_loss,
            take_profit: ab.take_profit,
        });
        self.ledger.push(TradeRecord {
            action: TradeAction::Buy,
            bar_index: index,
            timestamp: ab.bar.timestamp,
            price,
            reason: None,
        });
        Ok(())
    }

    /// First matching exit condition for the open position, if any.
    ///
    /// Order is fixed: stop-loss, then take-profit, then the sell signal.
    pub fn exit_reason(&self, ab: &AnnotatedBar) -> Option<ExitReason> {
        let position = self.position.as_ref()?;
        if position.stop_hit(ab.bar.low) {
            Some(ExitReason::StopLoss)
        } else if position.target_hit(ab.bar.high) {
            Some(ExitReason::TakeProfit)
        } else if ab.signal == Signal::Sell {
            Some(ExitReason::SellSignal)
        } else {
            None
        }
    }

    /// LONG → FLAT at the bar's close, charging the fee on the trade value.
    pub fn close(
        &mut self,
        index: usize,
        ab: &AnnotatedBar,
        reason: ExitReason,
        fee_rate: f64,
    ) -> Result<(), ComputationError> {
        let Some(position) = self.position.take() else {
            return Ok(());
        };
        let price = ensure_finite(ab.bar.close, index, "price")?;
        let trade_value = position.amount * price;
        let fee = trade_value * fee_rate;
        self.balance = ensure_finite(trade_value - fee, index, "balance")?;
        self.total_fees += fee;
        self.ledger.push(TradeRecord {
            action: TradeAction::Sell,
            bar_index: index,
            timestamp: ab.bar.timestamp,
            price,
            reason: Some(reason),
        });
        Ok(())
    }

    /// End-of-data liquidation: fee-free and not written to the ledger.
    pub fn liquidate(&mut self, index: usize, price: f64) -> Result<(), ComputationError> {
        if let Some(position) = self.position.take() {
            let price = ensure_finite(price, index, "price")?;
            self.balance = ensure_finite(position.amount * price, index, "balance")?;
        }
        Ok(())
    }
}
