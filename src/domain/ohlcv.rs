//! OHLCV bar representation and price series helpers.

use chrono::NaiveDateTime;

use crate::domain::error::RsitraderError;

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
    /// A bar where every price equals `close`.
    pub fn from_close(timestamp: NaiveDateTime, close: f64) -> Self {
        OhlcvBar {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }
}

/// Checks that timestamps strictly ascend and every close is a positive,
/// finite number.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), RsitraderError> {
    for (i, bar) in bars.iter().enumerate() {
        if !bar.close.is_finite() || bar.close <= 0.0 {
            return Err(RsitraderError::invalid_input(format!(
                "close at {} must be positive, got {}",
                bar.timestamp, bar.close
            )));
        }
        if i > 0 && bars[i - 1].timestamp >= bar.timestamp {
            return Err(RsitraderError::invalid_input(format!(
                "bars out of order at {} (previous {})",
                bar.timestamp,
                bars[i - 1].timestamp
            )));
        }
    }
    Ok(())
}

/// Borrow the bars with `start <= timestamp <= end`.
///
/// Assumes `bars` is sorted ascending by timestamp.
pub fn slice_between(bars: &[OhlcvBar], start: NaiveDateTime, end: NaiveDateTime) -> &[OhlcvBar] {
    let lo = bars.partition_point(|b| b.timestamp < start);
    let hi = bars.partition_point(|b| b.timestamp <= end);
    if lo >= hi { &[] } else { &bars[lo..hi] }
}

/// Stable-sort by timestamp and drop later bars sharing a timestamp with an
/// earlier one, so the first occurrence in input order wins.
pub fn sort_dedup_keep_first(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
    bars
}

pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
