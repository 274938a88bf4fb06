//! Raw OHLCV rows and indicator-augmented bars.

use chrono::NaiveDateTime;

/// One raw price sample as read from a file or returned by a venue.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// A bar after indicator augmentation. This is the only input the decision
/// core ever sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub fast_ma: f64,
    pub slow_ma: f64,
    pub atr: f64,
}

impl Bar {
    pub fn from_ohlcv(raw: &OhlcvBar, fast_ma: f64, slow_ma: f64, atr: f64) -> Self {
        Bar {
            timestamp: raw.timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
            fast_ma,
            slow_ma,
            atr,
        }
    }
}
