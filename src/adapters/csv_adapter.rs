//! CSV file data adapter.
//!
//! Reads `<base>/<SYMBOL>_<interval>.csv` with header
//! `timestamp,open,high,low,close,volume` and serves it in pages the way a
//! candle API does: the `page_size` most recent bars before the requested day.

use crate::domain::error::RsitraderError;
use crate::domain::ohlcv::{sort_dedup_keep_first, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 200;

pub struct CsvAdapter {
    base_path: PathBuf,
    page_size: usize,
    cache: RefCell<HashMap<PathBuf, Vec<OhlcvBar>>>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self::with_page_size(base_path, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(base_path: PathBuf, page_size: usize) -> Self {
        Self {
            base_path,
            page_size,
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn csv_path(&self, symbol: &str, interval: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, interval))
    }

    fn load(&self, path: &PathBuf) -> Result<Vec<OhlcvBar>, RsitraderError> {
        if let Some(bars) = self.cache.borrow().get(path) {
            return Ok(bars.clone());
        }

        let content = fs::read_to_string(path).map_err(|e| RsitraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let bars = parse_bars(&content)?;
        debug!(path = %path.display(), bars = bars.len(), "loaded CSV");

        self.cache.borrow_mut().insert(path.clone(), bars.clone());
        Ok(bars)
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, RsitraderError> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|e| RsitraderError::Data {
            reason: format!("invalid timestamp {:?}: {}", value, e),
        })
}

fn parse_field(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, RsitraderError> {
    record
        .get(index)
        .ok_or_else(|| RsitraderError::Data {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| RsitraderError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Parse CSV content into bars sorted by timestamp, keeping the first row for
/// any repeated timestamp.
pub fn parse_bars(content: &str) -> Result<Vec<OhlcvBar>, RsitraderError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut bars = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| RsitraderError::Data {
            reason: format!("CSV parse error: {}", e),
        })?;

        let ts_str = record.get(0).ok_or_else(|| RsitraderError::Data {
            reason: "missing timestamp column".into(),
        })?;

        bars.push(OhlcvBar {
            timestamp: parse_timestamp(ts_str)?,
            open: parse_field(&record, 1, "open")?,
            high: parse_field(&record, 2, "high")?,
            low: parse_field(&record, 3, "low")?,
            close: parse_field(&record, 4, "close")?,
            volume: parse_field(&record, 5, "volume")?,
        });
    }

    Ok(sort_dedup_keep_first(bars))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        interval: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsitraderError> {
        let path = self.csv_path(symbol, interval);
        let bars = self.load(&path)?;

        let cutoff = as_of.and_time(chrono::NaiveTime::MIN);
        let end = bars.partition_point(|b| b.timestamp < cutoff);
        let start = end.saturating_sub(self.page_size);
        Ok(bars[start..end].to_vec())
    }
}
