//! Trading venue port trait, used by the live loop only.
//!
//! Every call blocks. Transient failures should surface as
//! [`TraderError::Connectivity`] so the loop backs off and retries.

use std::collections::HashMap;

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait ExchangeGateway {
    /// Free amount per asset code, e.g. `"USDT" -> 120.5`.
    fn fetch_balance(&mut self) -> Result<HashMap<String, f64>, TraderError>;

    /// Most recent bars, oldest first.
    fn fetch_recent_bars(
        &mut self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<OhlcvBar>, TraderError>;

    /// Spend `quote_amount` of the quote asset at market.
    fn create_market_buy(&mut self, symbol: &str, quote_amount: f64) -> Result<(), TraderError>;

    /// Sell `base_amount` of the base asset at market.
    fn create_market_sell(&mut self, symbol: &str, base_amount: f64) -> Result<(), TraderError>;
}
