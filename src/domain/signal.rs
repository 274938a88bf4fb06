//! Entry/exit signal generation.

use super::ohlcv::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

/// Decides what to do on `current` given the bar before it.
///
/// Implementations must be pure: the same inputs always yield the same action.
pub trait SignalGenerator {
    fn signal(&self, current: &Bar, prev: &Bar, in_position: bool) -> Action;
}

/// Golden-cross entry: fast MA moves from strictly below to strictly above
/// the slow MA. Never emits [`Action::Sell`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossoverSignal;

impl CrossoverSignal {
    pub fn crossed_above(current: &Bar, prev: &Bar) -> bool {
        prev.fast_ma < prev.slow_ma && current.fast_ma > current.slow_ma
    }
}

impl SignalGenerator for CrossoverSignal {
    fn signal(&self, current: &Bar, prev: &Bar, in_position: bool) -> Action {
        if !in_position && Self::crossed_above(current, prev) {
            Action::Buy
        } else {
            Action::Hold
        }
    }
}
