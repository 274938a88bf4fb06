//! Paper-trading exchange gateway.
//!
//! Replays a fixed bar history as if it were a live venue: the first
//! `fetch_recent_bars` call reveals `initial_window` bars, every later call
//! reveals one more. Market orders fill at the latest visible close minus
//! the configured fee, against simulated free balances.

use std::collections::HashMap;

use crate::domain::config::MarketConfig;
use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::exchange_port::ExchangeGateway;

pub struct PaperGateway {
    bars: Vec<OhlcvBar>,
    visible: usize,
    initial_window: usize,
    market: MarketConfig,
    balances: HashMap<String, f64>,
    fee_rate: f64,
}

impl PaperGateway {
    pub fn new(
        bars: Vec<OhlcvBar>,
        market: MarketConfig,
        initial_quote: f64,
        fee_percent: f64,
        initial_window: usize,
    ) -> Self {
        let balances = HashMap::from([
            (market.base_asset.clone(), 0.0),
            (market.quote_asset.clone(), initial_quote),
        ]);
        PaperGateway {
            bars,
            visible: 0,
            initial_window: initial_window.max(1),
            market,
            balances,
            fee_rate: fee_percent / 100.0,
        }
    }

    pub fn balance(&self, asset: &str) -> f64 {
        self.balances.get(asset).copied().unwrap_or(0.0)
    }

    pub fn remaining_bars(&self) -> usize {
        self.bars.len().saturating_sub(self.visible)
    }

    /// Close of the newest revealed bar.
    pub fn last_close(&self) -> Option<f64> {
        self.visible
            .checked_sub(1)
            .and_then(|i| self.bars.get(i))
            .map(|b| b.close)
    }

    fn last_price(&self) -> Result<f64, TraderError> {
        self.last_close().ok_or_else(|| TraderError::Order {
            reason: "no market data yet".into(),
        })
    }

    fn check_symbol(&self, symbol: &str) -> Result<(), TraderError> {
        if symbol != self.market.symbol {
            return Err(TraderError::Order {
                reason: format!("unknown symbol {symbol}"),
            });
        }
        Ok(())
    }

    fn balance_mut(&mut self, asset: &str) -> &mut f64 {
        self.balances.entry(asset.to_string()).or_insert(0.0)
    }
}

impl ExchangeGateway for PaperGateway {
    fn fetch_balance(&mut self) -> Result<HashMap<String, f64>, TraderError> {
        Ok(self.balances.clone())
    }

    fn fetch_recent_bars(
        &mut self,
        symbol: &str,
        _timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError> {
        if symbol != self.market.symbol {
            return Err(TraderError::data(format!("no data for {symbol}")));
        }

        let next = if self.visible == 0 {
            self.initial_window
        } else {
            self.visible + 1
        };
        if next > self.bars.len() {
            return Err(TraderError::data("paper feed exhausted"));
        }
        self.visible = next;

        let start = self.visible.saturating_sub(limit);
        Ok(self.bars[start..self.visible].to_vec())
    }

    fn create_market_buy(&mut self, symbol: &str, quote_amount: f64) -> Result<(), TraderError> {
        self.check_symbol(symbol)?;
        let price = self.last_price()?;
        let quote_asset = self.market.quote_asset.clone();
        let base_asset = self.market.base_asset.clone();

        let available = self.balance(&quote_asset);
        if quote_amount <= 0.0 || quote_amount > available {
            return Err(TraderError::Order {
                reason: format!("cannot spend {quote_amount} {quote_asset}, {available} free"),
            });
        }

        *self.balance_mut(&quote_asset) -= quote_amount;
        *self.balance_mut(&base_asset) += quote_amount * (1.0 - self.fee_rate) / price;
        Ok(())
    }

    fn create_market_sell(&mut self, symbol: &str, base_amount: f64) -> Result<(), TraderError> {
        self.check_symbol(symbol)?;
        let price = self.last_price()?;
        let quote_asset = self.market.quote_asset.clone();
        let base_asset = self.market.base_asset.clone();

        let available = self.balance(&base_asset);
        if base_amount <= 0.0 || base_amount > available {
            return Err(TraderError::Order {
                reason: format!("cannot sell {base_amount} {base_asset}, {available} free"),
            });
        }

        *self.balance_mut(&base_asset) -= base_amount;
        *self.balance_mut(&quote_asset) += base_amount * price * (1.0 - self.fee_rate);
        Ok(())
    }
}
