//! Live polling loop.
//!
//! A cycle runs strictly in sequence: query balance, fetch recent bars,
//! augment them, decide on the last two bars, place the order, commit. The
//! only difference from replay is sizing: buys spend the whole free quote
//! balance and sells the whole free base balance.
//!
//! A failed cycle is never fatal. Connectivity and order failures are
//! retried, bad data skips the cycle, and anything unclassified is logged and
//! retried as well so an unattended loop keeps running. That last rule can
//! hide genuine bugs.

use std::time::Duration;

use chrono::NaiveDateTime;
use tracing::{error, info, warn};

use super::config::{LiveConfig, MarketConfig};
use super::error::{ErrorClass, TraderError};
use super::position::Event;
use super::simulation::{Engine, MIN_BARS};
use crate::ports::exchange_port::ExchangeGateway;
use crate::ports::indicator_port::IndicatorFeed;

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread. Not interruptible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returns immediately. For replaying history, where wall-clock waits are
/// meaningless.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&mut self, duration: Duration) {
        tracing::trace!("skipping sleep of {duration:?}");
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Committed(Event),
    /// The newest bar was already handled by an earlier cycle.
    StaleBar,
    /// A buy signal fired but the free quote balance was too small.
    BuySkipped { quote_balance: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub cycles: usize,
    pub failed: usize,
}

pub struct LiveTrader<G, F, S> {
    gateway: G,
    feed: F,
    sleeper: S,
    engine: Engine,
    market: MarketConfig,
    live: LiveConfig,
    last_bar: Option<NaiveDateTime>,
}

impl<G, F, S> LiveTrader<G, F, S>
where
    G: ExchangeGateway,
    F: IndicatorFeed,
    S: Sleeper,
{
    pub fn new(
        gateway: G,
        feed: F,
        sleeper: S,
        engine: Engine,
        market: MarketConfig,
        live: LiveConfig,
    ) -> Self {
        LiveTrader {
            gateway,
            feed,
            sleeper,
            engine,
            market,
            live,
            last_bar: None,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }

    /// Poll until the process is killed.
    pub fn run(&mut self) -> ! {
        loop {
            let _ = self.tick();
        }
    }

    pub fn run_cycles(&mut self, cycles: usize) -> SessionSummary {
        let mut summary = SessionSummary::default();
        for _ in 0..cycles {
            summary.cycles += 1;
            if self.tick().is_err() {
                summary.failed += 1;
            }
        }
        summary
    }

    /// One cycle plus the sleep that follows it.
    pub fn tick(&mut self) -> Result<CycleOutcome, ErrorClass> {
        match self.run_cycle() {
            Ok(outcome) => {
                info!(?outcome, "cycle complete, next poll in {:?}", self.live.poll_interval);
                self.sleeper.sleep(self.live.poll_interval);
                Ok(outcome)
            }
            Err(err) => {
                let backoff = self.live.retry_backoff;
                match &err {
                    TraderError::Connectivity { .. } => {
                        warn!("network error: {err}; retrying in {backoff:?}")
                    }
                    TraderError::Data { .. } | TraderError::InsufficientData { .. } => {
                        warn!("skipping cycle: {err}; retrying in {backoff:?}")
                    }
                    TraderError::Order { .. } => {
                        error!("order failed: {err}; retrying in {backoff:?}")
                    }
                    TraderError::Unexpected { .. } | TraderError::Io(_) => {
                        error!("unexpected error: {err}; retrying in {backoff:?}")
                    }
                    TraderError::ConfigParse { .. }
                    | TraderError::ConfigMissing { .. }
                    | TraderError::ConfigInvalid { .. } => {
                        error!("configuration error inside the loop: {err}; retrying in {backoff:?}")
                    }
                }
                self.sleeper.sleep(backoff);
                Err(err.class())
            }
        }
    }

    pub fn run_cycle(&mut self) -> Result<CycleOutcome, TraderError> {
        let balances = self.gateway.fetch_balance()?;
        let base_balance = balances
            .get(&self.market.base_asset)
            .copied()
            .unwrap_or(0.0);
        let quote_balance = balances
            .get(&self.market.quote_asset)
            .copied()
            .unwrap_or(0.0);
        info!(
            "free balance: {}={}, {}={:.2}",
            self.market.base_asset, base_balance, self.market.quote_asset, quote_balance
        );

        let rows = self.gateway.fetch_recent_bars(
            &self.market.symbol,
            &self.market.timeframe,
            self.live.bar_limit,
        )?;
        let bars = self.feed.augment(&rows);
        if bars.len() < MIN_BARS {
            return Err(TraderError::InsufficientData {
                bars: bars.len(),
                minimum: MIN_BARS,
            });
        }
        let prev = &bars[bars.len() - 2];
        let current = &bars[bars.len() - 1];

        if self.last_bar.is_some_and(|seen| current.timestamp <= seen) {
            return Ok(CycleOutcome::StaleBar);
        }

        let step = self.engine.decide(current, prev);
        match step.event {
            Event::Opened => {
                if quote_balance <= self.live.min_quote_order {
                    warn!(
                        "buy signal but only {:.2} {} free; staying flat",
                        quote_balance, self.market.quote_asset
                    );
                    self.last_bar = Some(current.timestamp);
                    return Ok(CycleOutcome::BuySkipped { quote_balance });
                }
                info!(
                    "buying {} with {:.2} {}",
                    self.market.base_asset, quote_balance, self.market.quote_asset
                );
                self.gateway
                    .create_market_buy(&self.market.symbol, quote_balance)?;
            }
            Event::Closed(reason) => {
                if base_balance > 0.0 {
                    info!(
                        "selling {} {} ({reason})",
                        base_balance, self.market.base_asset
                    );
                    self.gateway
                        .create_market_sell(&self.market.symbol, base_balance)?;
                } else {
                    warn!(
                        "exit ({reason}) with no {} balance to sell",
                        self.market.base_asset
                    );
                }
            }
            Event::Held => {}
        }

        let event = step.event;
        self.engine.commit(step);
        self.last_bar = Some(current.timestamp);
        if let Some(pos) = self.engine.state().open_position() {
            info!(
                stop = pos.trailing_stop_price,
                "in position, unrealized {:.2}%",
                pos.unrealized_pnl(current.close) * 100.0
            );
        }
        Ok(CycleOutcome::Committed(event))
    }
}
