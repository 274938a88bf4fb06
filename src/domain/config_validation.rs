//! Configuration validation.
//!
//! Validates all config fields before a backtest or live session starts.
//! Defaults used here must match the ones in [`crate::domain::config`].

use crate::domain::config::{defaults, split_symbol};
use crate::domain::error::TraderError;
use crate::ports::config_port::{parse_bool, ConfigPort};

const INT_KEYS: [(&str, &str); 6] = [
    ("indicators", "ma_fast_period"),
    ("indicators", "ma_slow_period"),
    ("indicators", "atr_period"),
    ("live", "poll_interval_secs"),
    ("live", "retry_backoff_secs"),
    ("live", "bar_limit"),
];

const FLOAT_KEYS: [(&str, &str); 4] = [
    ("risk", "trailing_stop_atr_multiplier"),
    ("backtest", "fee_percent"),
    ("backtest", "initial_balance"),
    ("live", "min_quote_order"),
];

const BOOL_KEYS: [(&str, &str); 1] = [("risk", "use_trailing_stop")];

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_value_types(config)?;
    validate_symbol(config)?;
    validate_timeframe(config)?;
    validate_periods(config)?;
    validate_multiplier(config)?;
    validate_fee(config)?;
    validate_initial_balance(config)?;
    validate_live(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Typed getters fall back to the default on a bad value, so anything present
/// must parse before it is read.
fn validate_value_types(config: &dyn ConfigPort) -> Result<(), TraderError> {
    for (section, key) in INT_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            if raw.trim().parse::<i64>().is_err() {
                return Err(invalid(section, key, "not an integer"));
            }
        }
    }
    for (section, key) in FLOAT_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            if !raw.trim().parse::<f64>().is_ok_and(f64::is_finite) {
                return Err(invalid(section, key, "not a number"));
            }
        }
    }
    for (section, key) in BOOL_KEYS {
        if let Some(raw) = config.get_string(section, key) {
            if parse_bool(&raw).is_none() {
                return Err(invalid(section, key, "not a boolean"));
            }
        }
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let symbol = config
        .get_string("market", "symbol")
        .unwrap_or_else(|| defaults::SYMBOL.to_string());
    if split_symbol(&symbol).is_none() {
        return Err(invalid(
            "market",
            "symbol",
            "symbol must look like BASE/QUOTE",
        ));
    }
    Ok(())
}

fn validate_timeframe(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("market", "timeframe") {
        Some(s) if s.trim().is_empty() => {
            Err(invalid("market", "timeframe", "timeframe must not be empty"))
        }
        _ => Ok(()),
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let fast = config.get_int("indicators", "ma_fast_period", defaults::MA_FAST_PERIOD as i64);
    let slow = config.get_int("indicators", "ma_slow_period", defaults::MA_SLOW_PERIOD as i64);
    let atr = config.get_int("indicators", "atr_period", defaults::ATR_PERIOD as i64);

    if fast <= 0 {
        return Err(invalid(
            "indicators",
            "ma_fast_period",
            "ma_fast_period must be positive",
        ));
    }
    if slow <= 0 {
        return Err(invalid(
            "indicators",
            "ma_slow_period",
            "ma_slow_period must be positive",
        ));
    }
    if fast >= slow {
        return Err(invalid(
            "indicators",
            "ma_fast_period",
            "ma_fast_period must be shorter than ma_slow_period",
        ));
    }
    if atr <= 0 {
        return Err(invalid(
            "indicators",
            "atr_period",
            "atr_period must be positive",
        ));
    }
    Ok(())
}

fn validate_multiplier(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double(
        "risk",
        "trailing_stop_atr_multiplier",
        defaults::ATR_MULTIPLIER,
    );
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "risk",
            "trailing_stop_atr_multiplier",
            "trailing_stop_atr_multiplier must be positive",
        ));
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("backtest", "fee_percent", defaults::FEE_PERCENT);
    if !(0.0..100.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "fee_percent",
            "fee_percent must be between 0 and 100",
        ));
    }
    Ok(())
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("backtest", "initial_balance", defaults::INITIAL_BALANCE);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            "backtest",
            "initial_balance",
            "initial_balance must be positive",
        ));
    }
    Ok(())
}

fn validate_live(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let poll = config.get_int("live", "poll_interval_secs", defaults::POLL_INTERVAL_SECS as i64);
    if poll <= 0 {
        return Err(invalid(
            "live",
            "poll_interval_secs",
            "poll_interval_secs must be positive",
        ));
    }

    let backoff = config.get_int("live", "retry_backoff_secs", defaults::RETRY_BACKOFF_SECS as i64);
    if backoff <= 0 {
        return Err(invalid(
            "live",
            "retry_backoff_secs",
            "retry_backoff_secs must be positive",
        ));
    }

    let slow = config.get_int("indicators", "ma_slow_period", defaults::MA_SLOW_PERIOD as i64);
    let atr = config.get_int("indicators", "atr_period", defaults::ATR_PERIOD as i64);
    let limit = config.get_int("live", "bar_limit", defaults::BAR_LIMIT as i64);
    // warm-up drops max(slow, atr) - 1 rows and a crossover needs two more
    if limit < slow.max(atr) + 1 {
        return Err(invalid(
            "live",
            "bar_limit",
            "bar_limit must leave at least two bars after indicator warm-up",
        ));
    }

    let min_order = config.get_double("live", "min_quote_order", defaults::MIN_QUOTE_ORDER);
    if min_order < 0.0 {
        return Err(invalid(
            "live",
            "min_quote_order",
            "min_quote_order must be non-negative",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            MapConfig(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    fn assert_invalid(entries: &[(&str, &str, &str)], expected_key: &str) {
        match validate_config(&MapConfig::new(entries)) {
            Err(TraderError::ConfigInvalid { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected ConfigInvalid for {expected_key}, got {other:?}"),
        }
    }

    fn invalid_reason(entries: &[(&str, &str, &str)]) -> String {
        match validate_config(&MapConfig::new(entries)) {
            Err(TraderError::ConfigInvalid { reason, .. }) => reason,
            other => panic!("expected ConfigInvalid, got {other:?}"),
        }
    }

    #[test]
    fn empty_config_uses_valid_defaults() {
        assert!(validate_config(&MapConfig::new(&[])).is_ok());
    }

    #[test]
    fn rejects_symbol_without_slash() {
        assert_invalid(&[("market", "symbol", "BTCUSDT")], "symbol");
        assert_invalid(&[("market", "symbol", "BTC/")], "symbol");
    }

    #[test]
    fn rejects_blank_timeframe() {
        assert_invalid(&[("market", "timeframe", "  ")], "timeframe");
    }

    #[test]
    fn rejects_fast_not_shorter_than_slow() {
        assert_invalid(
            &[
                ("indicators", "ma_fast_period", "9"),
                ("indicators", "ma_slow_period", "9"),
            ],
            "ma_fast_period",
        );
    }

    #[test]
    fn rejects_non_positive_periods() {
        assert_invalid(&[("indicators", "ma_fast_period", "0")], "ma_fast_period");
        assert_invalid(&[("indicators", "atr_period", "-3")], "atr_period");
    }

    #[test]
    fn rejects_non_positive_multiplier() {
        assert_invalid(
            &[("risk", "trailing_stop_atr_multiplier", "0")],
            "trailing_stop_atr_multiplier",
        );
    }

    #[test]
    fn rejects_bad_fee_and_balance() {
        assert_invalid(&[("backtest", "fee_percent", "-0.1")], "fee_percent");
        assert_invalid(&[("backtest", "fee_percent", "100")], "fee_percent");
        assert_invalid(&[("backtest", "initial_balance", "0")], "initial_balance");
    }

    #[test]
    fn rejects_bar_limit_too_small_for_warmup() {
        assert_invalid(&[("live", "bar_limit", "9")], "bar_limit");
        assert!(validate_config(&MapConfig::new(&[("live", "bar_limit", "10")])).is_ok());
    }

    #[test]
    fn rejects_unparseable_numbers() {
        assert_invalid(&[("backtest", "fee_percent", "0,5")], "fee_percent");
        assert_invalid(
            &[("risk", "trailing_stop_atr_multiplier", "3x")],
            "trailing_stop_atr_multiplier",
        );
        assert_invalid(&[("backtest", "initial_balance", "NaN")], "initial_balance");
        assert_invalid(&[("indicators", "atr_period", "9.5")], "atr_period");
        assert_invalid(&[("live", "bar_limit", "lots")], "bar_limit");
        assert_eq!(
            invalid_reason(&[("live", "min_quote_order", "ten")]),
            "not a number"
        );
    }

    #[test]
    fn rejects_unparseable_booleans() {
        assert_invalid(&[("risk", "use_trailing_stop", "flase")], "use_trailing_stop");
        assert_eq!(
            invalid_reason(&[("risk", "use_trailing_stop", "maybe")]),
            "not a boolean"
        );
        for ok in ["true", "No", " on ", "0"] {
            let config = MapConfig::new(&[("risk", "use_trailing_stop", ok)]);
            assert!(validate_config(&config).is_ok());
        }
    }

    #[test]
    fn rejects_non_positive_intervals() {
        assert_invalid(&[("live", "poll_interval_secs", "0")], "poll_interval_secs");
        assert_invalid(&[("live", "retry_backoff_secs", "-1")], "retry_backoff_secs");
    }
}
