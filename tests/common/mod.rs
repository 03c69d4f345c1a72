#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rsitrader::domain::driver::WindowResult;
use rsitrader::domain::error::RsitraderError;
use rsitrader::domain::metrics::RunSummary;
pub use rsitrader::domain::ohlcv::OhlcvBar;
use rsitrader::domain::strategy::StrategyParameters;
use rsitrader::ports::data_port::DataPort;
use rsitrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;

/// Serves the `page_size` most recent bars before `as_of`, like a candle API.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub page_size: usize,
    pub calls: RefCell<usize>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            page_size: 200,
            calls: RefCell::new(0),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        _interval: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, RsitraderError> {
        *self.calls.borrow_mut() += 1;
        if let Some(reason) = self.errors.get(symbol) {
            return Err(RsitraderError::Data {
                reason: reason.clone(),
            });
        }
        let bars = self.data.get(symbol).cloned().unwrap_or_default();
        let cutoff = as_of.and_hms_opt(0, 0, 0).unwrap();
        let end = bars.partition_point(|b| b.timestamp < cutoff);
        let start = end.saturating_sub(self.page_size);
        Ok(bars[start..end].to_vec())
    }
}

/// Records everything it is handed.
#[derive(Default)]
pub struct RecordingReport {
    pub windows: RefCell<Vec<WindowResult>>,
    pub summary: RefCell<Option<RunSummary>>,
}

impl ReportPort for RecordingReport {
    fn report(&self, result: &WindowResult) -> Result<(), RsitraderError> {
        self.windows.borrow_mut().push(result.clone());
        Ok(())
    }

    fn finish(&self, summary: &RunSummary) -> Result<(), RsitraderError> {
        *self.summary.borrow_mut() = Some(summary.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap()
}

/// One bar per `step`, starting at 2024-01-01 00:00.
pub fn bars_every(step: Duration, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = midnight(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| OhlcvBar {
            timestamp: start + step * i as i32,
            open: c,
            high: c + 1.0,
            low: c - 1.0,
            close: c,
            volume: 1000.0,
        })
        .collect()
}

pub fn daily_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    bars_every(Duration::days(1), closes)
}

/// A deterministic oscillating price path that crosses both default thresholds.
pub fn swing_prices(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 + 15.0 * (t * 0.21).sin() + 6.0 * (t * 0.9).cos()
        })
        .collect()
}

/// 15 bars falling by 1 from 100, then 5 bars rising by 1.
pub fn fall_then_rise() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
    closes.extend((1..=5).map(|i| 86.0 + i as f64));
    closes
}

pub fn default_params() -> StrategyParameters {
    StrategyParameters::default()
}
