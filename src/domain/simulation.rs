//! Decision engine shared by historical replay and live polling.
//!
//! One cycle is [`Engine::decide`] followed by [`Engine::commit`]. Replay
//! commits every step. The live loop commits only after the venue accepted
//! the order, which is the single point where the two modes differ.

use tracing::{debug, info};

use super::error::TraderError;
use super::ledger::TradeLedger;
use super::ohlcv::Bar;
use super::position::{Event, PositionState, PositionStateMachine, RiskConfig, Step};
use super::signal::{CrossoverSignal, SignalGenerator};

/// A crossover needs the bar before the current one.
pub const MIN_BARS: usize = 2;

pub struct Engine {
    machine: PositionStateMachine,
    signals: Box<dyn SignalGenerator>,
    state: PositionState,
    ledger: TradeLedger,
}

impl Engine {
    pub fn new(risk: RiskConfig, signals: Box<dyn SignalGenerator>) -> Self {
        Engine {
            machine: PositionStateMachine::new(risk),
            signals,
            state: PositionState::Flat,
            ledger: TradeLedger::new(),
        }
    }

    pub fn crossover(risk: RiskConfig) -> Self {
        Self::new(risk, Box::new(CrossoverSignal))
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    pub fn into_parts(self) -> (PositionState, TradeLedger) {
        (self.state, self.ledger)
    }

    /// Evaluate one bar without changing the engine.
    pub fn decide(&self, current: &Bar, prev: &Bar) -> Step {
        self.machine
            .step(&self.state, current, prev, self.signals.as_ref())
    }

    pub fn commit(&mut self, step: Step) {
        match step.event {
            Event::Opened => {
                if let Some(pos) = step.state.open_position() {
                    info!(
                        entry_price = pos.entry_price,
                        stop = pos.trailing_stop_price,
                        "opened position at {}",
                        pos.entry_time
                    );
                }
            }
            Event::Closed(reason) => {
                if let Some(trade) = &step.trade {
                    info!(
                        exit_price = trade.exit_price(),
                        pnl_pct = trade.pnl_percent() * 100.0,
                        "closed position ({reason}) at {}",
                        trade.exit_time()
                    );
                }
            }
            Event::Held => {
                if let Some(pos) = step.state.open_position() {
                    debug!(stop = pos.trailing_stop_price, "holding");
                }
            }
        }

        if let Some(trade) = step.trade {
            self.ledger.record(trade);
        }
        self.state = step.state;
    }

    pub fn on_bar(&mut self, current: &Bar, prev: &Bar) -> Event {
        let step = self.decide(current, prev);
        let event = step.event;
        self.commit(step);
        event
    }

    /// Run every consecutive pair of bars through the engine. Timestamps
    /// must be strictly increasing.
    pub fn replay(&mut self, bars: &[Bar]) -> Result<usize, TraderError> {
        if bars.len() < MIN_BARS {
            return Err(TraderError::InsufficientData {
                bars: bars.len(),
                minimum: MIN_BARS,
            });
        }
        if let Some(pair) = bars.windows(2).find(|p| p[1].timestamp <= p[0].timestamp) {
            return Err(TraderError::data(format!(
                "bar at {} does not follow {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
        for pair in bars.windows(2) {
            self.on_bar(&pair[1], &pair[0]);
        }
        Ok(bars.len() - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub ledger: TradeLedger,
    /// A position still open when the data runs out is left open and is not
    /// booked as a trade.
    pub final_state: PositionState,
    pub bars_processed: usize,
}

pub fn run_backtest(bars: &[Bar], risk: RiskConfig) -> Result<BacktestResult, TraderError> {
    let mut engine = Engine::crossover(risk);
    let bars_processed = engine.replay(bars)?;
    let (final_state, ledger) = engine.into_parts();
    Ok(BacktestResult {
        ledger,
        final_state,
        bars_processed,
    })
}
