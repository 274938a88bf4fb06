//! Indicator augmentation port trait.

use crate::domain::ohlcv::{Bar, OhlcvBar};

/// Turns raw rows into [`Bar`]s carrying fast MA, slow MA and ATR.
///
/// Rows whose indicators are still warming up are dropped, so the output is
/// `rows.len().saturating_sub(self.warmup())` bars long.
pub trait IndicatorFeed {
    fn augment(&self, rows: &[OhlcvBar]) -> Vec<Bar>;

    /// Number of leading rows dropped by [`IndicatorFeed::augment`].
    fn warmup(&self) -> usize;
}
