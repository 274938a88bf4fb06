//! Immutable run configuration, built once from a [`ConfigPort`].
//!
//! Sections and keys:
//!
//! ```ini
//! [market]
//! symbol = BTC/USDT
//! timeframe = 1h
//!
//! [indicators]
//! ma_fast_period = 4
//! ma_slow_period = 9
//! atr_period = 9
//!
//! [risk]
//! use_trailing_stop = true
//! trailing_stop_atr_multiplier = 2
//!
//! [backtest]
//! csv_filepath = data/BTC1H.csv
//! initial_balance = 5
//! fee_percent = 0.1
//!
//! [live]
//! poll_interval_secs = 3600
//! retry_backoff_secs = 60
//! bar_limit = 200
//! min_quote_order = 10
//! ```

use std::path::PathBuf;
use std::time::Duration;

use super::config_validation::validate_config;
use super::error::TraderError;
use super::metrics::MetricsConfig;
use super::position::RiskConfig;
use crate::ports::config_port::ConfigPort;

pub mod defaults {
    pub const SYMBOL: &str = "BTC/USDT";
    pub const TIMEFRAME: &str = "1h";
    pub const MA_FAST_PERIOD: usize = 4;
    pub const MA_SLOW_PERIOD: usize = 9;
    pub const ATR_PERIOD: usize = 9;
    pub const USE_TRAILING_STOP: bool = true;
    pub const ATR_MULTIPLIER: f64 = 2.0;
    pub const INITIAL_BALANCE: f64 = 5.0;
    pub const FEE_PERCENT: f64 = 0.1;
    pub const POLL_INTERVAL_SECS: u64 = 3600;
    pub const RETRY_BACKOFF_SECS: u64 = 60;
    pub const BAR_LIMIT: usize = 200;
    pub const MIN_QUOTE_ORDER: f64 = 10.0;
}

/// `"BTC/USDT"` → `("BTC", "USDT")`. Both halves must be non-empty.
pub fn split_symbol(symbol: &str) -> Option<(&str, &str)> {
    let (base, quote) = symbol.trim().split_once('/')?;
    let (base, quote) = (base.trim(), quote.trim());
    if base.is_empty() || quote.is_empty() || quote.contains('/') {
        return None;
    }
    Some((base, quote))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketConfig {
    pub symbol: String,
    pub timeframe: String,
    pub base_asset: String,
    pub quote_asset: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub atr_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            fast_period: defaults::MA_FAST_PERIOD,
            slow_period: defaults::MA_SLOW_PERIOD,
            atr_period: defaults::ATR_PERIOD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveConfig {
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
    pub bar_limit: usize,
    /// Buys are skipped when the free quote balance is not above this.
    pub min_quote_order: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            poll_interval: Duration::from_secs(defaults::POLL_INTERVAL_SECS),
            retry_backoff: Duration::from_secs(defaults::RETRY_BACKOFF_SECS),
            bar_limit: defaults::BAR_LIMIT,
            min_quote_order: defaults::MIN_QUOTE_ORDER,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub market: MarketConfig,
    pub indicators: IndicatorConfig,
    pub risk: RiskConfig,
    pub metrics: MetricsConfig,
    pub live: LiveConfig,
    pub csv_filepath: Option<PathBuf>,
}

impl TraderConfig {
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, TraderError> {
        validate_config(port)?;

        let symbol = port
            .get_string("market", "symbol")
            .unwrap_or_else(|| defaults::SYMBOL.to_string())
            .trim()
            .to_string();
        let (base_asset, quote_asset) =
            split_symbol(&symbol).ok_or_else(|| TraderError::ConfigInvalid {
                section: "market".into(),
                key: "symbol".into(),
                reason: "symbol must look like BASE/QUOTE".into(),
            })?;
        let market = MarketConfig {
            base_asset: base_asset.to_string(),
            quote_asset: quote_asset.to_string(),
            timeframe: port
                .get_string("market", "timeframe")
                .unwrap_or_else(|| defaults::TIMEFRAME.to_string())
                .trim()
                .to_string(),
            symbol,
        };

        let indicators = IndicatorConfig {
            fast_period: get_usize(port, "indicators", "ma_fast_period", defaults::MA_FAST_PERIOD),
            slow_period: get_usize(port, "indicators", "ma_slow_period", defaults::MA_SLOW_PERIOD),
            atr_period: get_usize(port, "indicators", "atr_period", defaults::ATR_PERIOD),
        };

        let risk = RiskConfig {
            use_trailing_stop: port.get_bool(
                "risk",
                "use_trailing_stop",
                defaults::USE_TRAILING_STOP,
            ),
            atr_multiplier: port.get_double(
                "risk",
                "trailing_stop_atr_multiplier",
                defaults::ATR_MULTIPLIER,
            ),
        };

        let metrics = MetricsConfig {
            fee_percent: port.get_double("backtest", "fee_percent", defaults::FEE_PERCENT),
            initial_balance: port.get_double(
                "backtest",
                "initial_balance",
                defaults::INITIAL_BALANCE,
            ),
        };

        let live = LiveConfig {
            poll_interval: Duration::from_secs(get_u64(
                port,
                "live",
                "poll_interval_secs",
                defaults::POLL_INTERVAL_SECS,
            )),
            retry_backoff: Duration::from_secs(get_u64(
                port,
                "live",
                "retry_backoff_secs",
                defaults::RETRY_BACKOFF_SECS,
            )),
            bar_limit: get_usize(port, "live", "bar_limit", defaults::BAR_LIMIT),
            min_quote_order: port.get_double("live", "min_quote_order", defaults::MIN_QUOTE_ORDER),
        };

        let csv_filepath = port
            .get_string("backtest", "csv_filepath")
            .filter(|s| !s.trim().is_empty())
            .map(|s| PathBuf::from(s.trim()));

        Ok(TraderConfig {
            market,
            indicators,
            risk,
            metrics,
            live,
            csv_filepath,
        })
    }
}

// Sign checks happen in validation, so the casts below never wrap.
fn get_usize(port: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    port.get_int(section, key, default as i64).max(0) as usize
}

fn get_u64(port: &dyn ConfigPort, section: &str, key: &str, default: u64) -> u64 {
    port.get_int(section, key, default as i64).max(0) as u64
}
