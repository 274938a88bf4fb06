//! Position state and the Flat/Open transition rules.
//!
//! The state is a value: [`PositionStateMachine::step`] takes the current
//! state and returns the next one, so transitions can be exercised without a
//! running loop.
//!
//! Per bar, in order:
//! 1. Open: refresh ATR and ratchet the trailing stop (when enabled).
//! 2. Open: `close <= trailing_stop_price` closes at the stop level. The
//!    signal generator is not consulted on that bar.
//! 3. Otherwise the signal decides: `Buy` opens when flat, `Sell` closes at
//!    the bar close when open, anything else holds.

use chrono::NaiveDateTime;

use super::ledger::{ExitReason, Trade};
use super::ohlcv::Bar;
use super::signal::{Action, SignalGenerator};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    pub use_trailing_stop: bool,
    pub atr_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            use_trailing_stop: true,
            atr_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenPosition {
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub highest_price_since_entry: f64,
    pub trailing_stop_price: f64,
    pub latest_atr: f64,
}

impl OpenPosition {
    /// Fractional gain or loss if the position were closed at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        price / self.entry_price - 1.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PositionState {
    #[default]
    Flat,
    Open(OpenPosition),
}

impl PositionState {
    pub fn in_position(&self) -> bool {
        matches!(self, PositionState::Open(_))
    }

    pub fn open_position(&self) -> Option<&OpenPosition> {
        match self {
            PositionState::Open(pos) => Some(pos),
            PositionState::Flat => None,
        }
    }
}

/// What a single step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Opened,
    Held,
    Closed(ExitReason),
}

/// Outcome of one bar: the next state, the event, and a trade on close.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub state: PositionState,
    pub event: Event,
    pub trade: Option<Trade>,
}

impl Step {
    fn held(state: PositionState) -> Self {
        Step {
            state,
            event: Event::Held,
            trade: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PositionStateMachine {
    config: RiskConfig,
}

impl PositionStateMachine {
    pub fn new(config: RiskConfig) -> Self {
        PositionStateMachine { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn step(
        &self,
        state: &PositionState,
        current: &Bar,
        prev: &Bar,
        signals: &dyn SignalGenerator,
    ) -> Step {
        match state {
            PositionState::Open(pos) => {
                let pos = self.track(pos, current);

                if self.config.use_trailing_stop && current.close <= pos.trailing_stop_price {
                    let exit_price = pos.trailing_stop_price;
                    return Self::exit(&pos, current, exit_price, ExitReason::TrailingStop);
                }

                match signals.signal(current, prev, true) {
                    Action::Sell => Self::exit(&pos, current, current.close, ExitReason::Signal),
                    Action::Buy | Action::Hold => Step::held(PositionState::Open(pos)),
                }
            }
            PositionState::Flat => match signals.signal(current, prev, false) {
                Action::Buy => Step {
                    state: PositionState::Open(self.enter(current)),
                    event: Event::Opened,
                    trade: None,
                },
                Action::Sell | Action::Hold => Step::held(PositionState::Flat),
            },
        }
    }

    /// Fresh position at the bar close. The initial stop sits
    /// `atr * multiplier` below the entry.
    pub fn enter(&self, bar: &Bar) -> OpenPosition {
        OpenPosition {
            entry_price: bar.close,
            entry_time: bar.timestamp,
            highest_price_since_entry: bar.close,
            trailing_stop_price: bar.close - bar.atr * self.config.atr_multiplier,
            latest_atr: bar.atr,
        }
    }

    /// Refresh ATR and ratchet the stop. The stop never moves down.
    pub fn track(&self, pos: &OpenPosition, bar: &Bar) -> OpenPosition {
        let mut next = pos.clone();
        next.latest_atr = bar.atr;
        if !self.config.use_trailing_stop {
            return next;
        }

        next.highest_price_since_entry = next.highest_price_since_entry.max(bar.close);
        let candidate = next.highest_price_since_entry - bar.atr * self.config.atr_multiplier;
        next.trailing_stop_price = next.trailing_stop_price.max(candidate);
        next
    }

    fn exit(pos: &OpenPosition, bar: &Bar, exit_price: f64, reason: ExitReason) -> Step {
        Step {
            state: PositionState::Flat,
            event: Event::Closed(reason),
            trade: Some(Trade::close(
                pos.entry_time,
                pos.entry_price,
                bar.timestamp,
                exit_price,
                reason,
            )),
        }
    }
}
