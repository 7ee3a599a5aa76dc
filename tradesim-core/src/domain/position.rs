//! Position: the single open holding while the engine is LONG.

use serde::{Deserialize, Serialize};

/// Units held plus the exit thresholds latched at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub amount: f64,
    pub entry_index: usize,
    pub entry_price: f64,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl Position {
    /// Stop-loss hit: the bar traded at or below the latched stop.
    pub fn stop_hit(&self, low: f64) -> bool {
        self.stop_loss.is_some_and(|stop| low <= stop)
    }

    /// Take-profit hit: the bar traded at or above the latched target.
    pub fn target_hit(&self, high: f64) -> bool {
        self.take_profit.is_some_and(|take| high >= take)
    }
}
