#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use crosstrader::domain::error::TraderError;
use crosstrader::domain::live::Sleeper;
pub use crosstrader::domain::ohlcv::{Bar, OhlcvBar};
use crosstrader::ports::data_port::DataPort;
use crosstrader::ports::exchange_port::ExchangeGateway;
use crosstrader::ports::indicator_port::IndicatorFeed;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub fn at(hour: u32) -> NaiveDateTime {
    base_time() + chrono::Duration::hours(hour as i64)
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Augmented bar with flat OHLC at `close`.
pub fn make_bar(hour: u32, close: f64, fast: f64, slow: f64, atr: f64) -> Bar {
    Bar {
        timestamp: at(hour),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1.0,
        fast_ma: fast,
        slow_ma: slow,
        atr,
    }
}

pub fn make_row(hour: u32, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: at(hour),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 100.0,
    }
}

pub fn make_rows(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_row(i as u32, c))
        .collect()
}

/// Falls for a while, rallies, then breaks down hard, so a short-over-long
/// EMA pair crosses up and the trailing stop fires afterwards.
pub fn rally_then_crash(len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let i = i as f64;
            let price = if i < 15.0 {
                100.0 - i
            } else if i < 35.0 {
                85.0 + (i - 15.0) * 2.0
            } else {
                125.0 - (i - 35.0) * 4.0
            };
            price.max(5.0)
        })
        .collect()
}

pub fn rows_to_csv(rows: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            r.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.open,
            r.high,
            r.low,
            r.close,
            r.volume
        ));
    }
    out
}

pub struct MockDataPort {
    pub rows: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(rows: Vec<OhlcvBar>) -> Self {
        Self { rows, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, TraderError> {
        match &self.error {
            Some(reason) => Err(TraderError::data(reason.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

/// Reads indicator values out of the raw row: open = fast, high = slow,
/// low = ATR.
pub struct PassThroughFeed;

impl IndicatorFeed for PassThroughFeed {
    fn augment(&self, rows: &[OhlcvBar]) -> Vec<Bar> {
        rows.iter()
            .map(|r| Bar::from_ohlcv(r, r.open, r.high, r.low))
            .collect()
    }

    fn warmup(&self) -> usize {
        0
    }
}

pub fn encoded_row(hour: u32, close: f64, fast: f64, slow: f64, atr: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: at(hour),
        open: fast,
        high: slow,
        low: atr,
        close,
        volume: 1.0,
    }
}

#[derive(Default)]
pub struct MockGateway {
    pub balances: HashMap<String, f64>,
    pub windows: VecDeque<Result<Vec<OhlcvBar>, TraderError>>,
    pub buys: Vec<f64>,
    pub sells: Vec<f64>,
    pub reject_orders: bool,
}

impl MockGateway {
    pub fn with_balances(base: f64, quote: f64) -> Self {
        Self {
            balances: HashMap::from([("BTC".to_string(), base), ("USDT".to_string(), quote)]),
            ..Default::default()
        }
    }

    pub fn then(mut self, window: Result<Vec<OhlcvBar>, TraderError>) -> Self {
        self.windows.push_back(window);
        self
    }
}

impl ExchangeGateway for MockGateway {
    fn fetch_balance(&mut self) -> Result<HashMap<String, f64>, TraderError> {
        Ok(self.balances.clone())
    }

    fn fetch_recent_bars(
        &mut self,
        _symbol: &str,
        _timeframe: &str,
        _limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        self.windows
            .pop_front()
            .unwrap_or_else(|| Err(TraderError::connectivity("no more windows")))
    }

    fn create_market_buy(&mut self, _symbol: &str, quote_amount: f64) -> Result<(), TraderError> {
        if self.reject_orders {
            return Err(TraderError::Order {
                reason: "rejected".into(),
            });
        }
        self.buys.push(quote_amount);
        Ok(())
    }

    fn create_market_sell(&mut self, _symbol: &str, base_amount: f64) -> Result<(), TraderError> {
        if self.reject_orders {
            return Err(TraderError::Order {
                reason: "rejected".into(),
            });
        }
        self.sells.push(base_amount);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub sleeps: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
