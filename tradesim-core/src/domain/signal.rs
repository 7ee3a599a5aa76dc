//! Per-bar directional intent and the annotated bar a generator emits.

use serde::{Deserialize, Serialize};

use super::bar::Bar;

/// Directional intent for one bar: sell (-1), none (0), buy (+1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Sell,
    #[default]
    None,
    Buy,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Sell => -1,
            Signal::None => 0,
            Signal::Buy => 1,
        }
    }
}

impl TryFrom<i8> for Signal {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Signal::Sell),
            0 => Ok(Signal::None),
            1 => Ok(Signal::Buy),
            other => Err(other),
        }
    }
}

/// A bar plus the fields a signal generator defines for it.
///
/// `stop_loss` / `take_profit` are absolute price levels. Generators only set
/// them on buy bars; the engine latches them when it opens a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    pub bar: Bar,
    pub signal: Signal,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl AnnotatedBar {
    /// A bar with no signal and no exit levels.
    pub fn flat(bar: Bar) -> Self {
        Self {
            bar,
            signal: Signal::None,
            stop_loss: None,
            take_profit: None,
        }
    }
}
