use bt_types::{Decision, Direction, SignalPairs};

use crate::types::Position;

/// Decomposes a Signal's advisories into the single decision the portfolio
/// should act on, given whether (and how) the symbol is currently invested.
///
/// - Invested Long: act on `CloseLong` if advised, else do nothing.
/// - Invested Short: act on `CloseShort` if advised, else do nothing.
/// - Not invested: prefer `Long`, then `Short`, else do nothing.
pub fn decompose(signals: &SignalPairs, open_position: Option<&Position>) -> Decision {
    match open_position.map(|p| p.direction) {
        Some(Direction::Long) => {
            if signals.contains_key(&Decision::CloseLong) {
                Decision::CloseLong
            } else {
                Decision::Nothing
            }
        }
        Some(Direction::Short) => {
            if signals.contains_key(&Decision::CloseShort) {
                Decision::CloseShort
            } else {
                Decision::Nothing
            }
        }
        None => {
            if signals.contains_key(&Decision::Long) {
                Decision::Long
            } else if signals.contains_key(&Decision::Short) {
                Decision::Short
            } else {
                Decision::Nothing
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invested_long_closes_on_close_long_advisory() {
        let mut signals = SignalPairs::new();
        signals.insert(Decision::CloseLong, 1.0);
        signals.insert(Decision::Short, 1.0);
        // decompose needs an open Position; exercised at the Portfolio
        // level in lib.rs's integration tests since Position::enter
        // requires a fill. Here we only check the not-invested branch,
        // which needs no position at all.
        assert_eq!(decompose(&signals, None), Decision::Short);
    }

    #[test]
    fn not_invested_prefers_long_over_short() {
        let mut signals = SignalPairs::new();
        signals.insert(Decision::Long, 1.0);
        signals.insert(Decision::Short, 1.0);
        assert_eq!(decompose(&signals, None), Decision::Long);
    }

    #[test]
    fn not_invested_with_no_advisory_is_nothing() {
        let signals = SignalPairs::new();
        assert_eq!(decompose(&signals, None), Decision::Nothing);
    }
}
