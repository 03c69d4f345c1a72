//! Assembles one continuous price history from a paged data source.
//!
//! The source returns a page of the most recent bars before a given day.
//! Walking every day in the requested range and merging the pages yields
//! overlapping bars, which are dropped keeping the first fetched copy.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::error::RsitraderError;
use crate::domain::ohlcv::{sort_dedup_keep_first, OhlcvBar};
use crate::ports::data_port::DataPort;

#[derive(Debug, Clone, PartialEq)]
pub struct DataRequest {
    pub symbol: String,
    pub interval: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn assemble_history(
    data_port: &dyn DataPort,
    request: &DataRequest,
) -> Result<Vec<OhlcvBar>, RsitraderError> {
    if request.start_date > request.end_date {
        return Err(RsitraderError::invalid_input(format!(
            "start date {} is after end date {}",
            request.start_date, request.end_date
        )));
    }

    let mut fetched = Vec::new();
    let mut pages = 0usize;
    for as_of in request.start_date.iter_days() {
        if as_of > request.end_date {
            break;
        }
        let page = data_port.fetch_ohlcv(&request.symbol, &request.interval, as_of)?;
        debug!(symbol = %request.symbol, %as_of, bars = page.len(), "fetched page");
        fetched.extend(page);
        pages += 1;
    }

    let raw = fetched.len();
    let history = sort_dedup_keep_first(fetched);
    if history.is_empty() {
        return Err(RsitraderError::NoData {
            symbol: request.symbol.clone(),
            interval: request.interval.clone(),
        });
    }

    info!(
        symbol = %request.symbol,
        interval = %request.interval,
        pages,
        bars = history.len(),
        duplicates = raw - history.len(),
        "assembled price history"
    );
    Ok(history)
}
