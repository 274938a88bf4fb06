//! Completed trades and the append-only trade ledger.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    Signal,
    TrailingStop,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "Signal"),
            ExitReason::TrailingStop => write!(f, "Trailing Stop"),
        }
    }
}

/// A round trip from entry to exit. Fields are private so `pnl_percent`
/// can only come from [`Trade::close`].
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    entry_time: NaiveDateTime,
    exit_time: NaiveDateTime,
    entry_price: f64,
    exit_price: f64,
    pnl_percent: f64,
    exit_reason: ExitReason,
}

impl Trade {
    pub fn close(
        entry_time: NaiveDateTime,
        entry_price: f64,
        exit_time: NaiveDateTime,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        Trade {
            entry_time,
            exit_time,
            entry_price,
            exit_price,
            pnl_percent: exit_price / entry_price - 1.0,
            exit_reason,
        }
    }

    pub fn entry_time(&self) -> NaiveDateTime {
        self.entry_time
    }

    pub fn exit_time(&self) -> NaiveDateTime {
        self.exit_time
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn exit_price(&self) -> f64 {
        self.exit_price
    }

    /// Gross return as a fraction, before fees.
    pub fn pnl_percent(&self) -> f64 {
        self.pnl_percent
    }

    pub fn exit_reason(&self) -> ExitReason {
        self.exit_reason
    }
}

/// Trades in the order they were closed. There is no way to edit or drop a
/// recorded trade.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeLedger {
    trades: Vec<Trade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trade> {
        self.trades.iter()
    }

    pub fn as_slice(&self) -> &[Trade] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn last(&self) -> Option<&Trade> {
        self.trades.last()
    }
}

impl<'a> IntoIterator for &'a TradeLedger {
    type Item = &'a Trade;
    type IntoIter = std::slice::Iter<'a, Trade>;

    fn into_iter(self) -> Self::IntoIter {
        self.trades.iter()
    }
}
