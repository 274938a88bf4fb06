//! Historical data access port trait.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// All rows of the source, oldest first.
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, TraderError>;
}
