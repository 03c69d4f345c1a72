//! Market data access port.

use crate::domain::error::RsitraderError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// One page of the most recent bars strictly before `as_of`, ascending
    /// by timestamp with no duplicates.
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsitraderError>;
}
