//! EMA/ATR indicator feed.
//!
//! EMA: k = 2/(n+1), seeded with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). First (n-1) values are warm-up.
//!
//! ATR: Wilder smoothing. TR[0] = high - low, TR[i] uses the previous close.
//! Seeded with the mean of the first n TRs, then
//! ATR[i] = (ATR[i-1]*(n-1) + TR[i]) / n. First (n-1) values are warm-up.

use crate::domain::config::IndicatorConfig;
use crate::domain::ohlcv::{Bar, OhlcvBar};
use crate::ports::indicator_port::IndicatorFeed;

#[derive(Debug, Clone, Copy)]
pub struct EmaAtrFeed {
    config: IndicatorConfig,
}

impl EmaAtrFeed {
    pub fn new(config: IndicatorConfig) -> Self {
        EmaAtrFeed { config }
    }
}

/// `None` while warming up.
pub fn calculate_ema(rows: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; rows.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(rows.len());
    let mut ema = 0.0;
    let mut sum = 0.0;

    for (i, row) in rows.iter().enumerate() {
        if i < period - 1 {
            sum += row.close;
            values.push(None);
        } else if i == period - 1 {
            sum += row.close;
            ema = sum / period as f64;
            values.push(Some(ema));
        } else {
            ema = row.close * k + ema * (1.0 - k);
            values.push(Some(ema));
        }
    }
    values
}

/// `None` while warming up.
pub fn calculate_atr(rows: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; rows.len()];
    }

    let mut values = Vec::with_capacity(rows.len());
    let mut atr = 0.0;
    let mut tr_sum = 0.0;

    for (i, row) in rows.iter().enumerate() {
        let tr = if i == 0 {
            row.high - row.low
        } else {
            row.true_range(rows[i - 1].close)
        };

        if i < period - 1 {
            tr_sum += tr;
            values.push(None);
        } else if i == period - 1 {
            tr_sum += tr;
            atr = tr_sum / period as f64;
            values.push(Some(atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr) / period as f64;
            values.push(Some(atr));
        }
    }
    values
}

impl IndicatorFeed for EmaAtrFeed {
    fn augment(&self, rows: &[OhlcvBar]) -> Vec<Bar> {
        let fast = calculate_ema(rows, self.config.fast_period);
        let slow = calculate_ema(rows, self.config.slow_period);
        let atr = calculate_atr(rows, self.config.atr_period);

        rows.iter()
            .enumerate()
            .filter_map(|(i, row)| match (fast[i], slow[i], atr[i]) {
                (Some(f), Some(s), Some(a)) => Some(Bar::from_ohlcv(row, f, s, a)),
                _ => None,
            })
            .collect()
    }

    fn warmup(&self) -> usize {
        self.config
            .fast_period
            .max(self.config.slow_period)
            .max(self.config.atr_period)
            .saturating_sub(1)
    }
}
