//! Domain types for TradeSim.

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use position::Position;
pub use signal::{AnnotatedBar, Signal};
pub use trade::{ExitReason, TradeAction, TradeRecord};
