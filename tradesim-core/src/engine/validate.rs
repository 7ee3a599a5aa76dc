//! Up-front checks on the bar sequence, run before the scan starts.

use crate::domain::AnnotatedBar;
use crate::error::InputError;

/// Reject sequences the engine cannot meaningfully scan.
///
/// Needs at least two bars with strictly increasing timestamps.
pub fn validate_bars(bars: &[AnnotatedBar]) -> Result<(), InputError> {
    match bars.len() {
        0 => return Err(InputError::Empty),
        1 => return Err(InputError::TooFewBars { count: 1 }),
        _ => {}
    }
    for (index, pair) in bars.windows(2).enumerate() {
        let (previous, current) = (pair[0].bar.timestamp, pair[1].bar.timestamp);
        if current <= previous {
            return Err(InputError::NonIncreasingTimestamp {
                index: index + 1,
                previous,
                current,
            });
        }
    }
    Ok(())
}
