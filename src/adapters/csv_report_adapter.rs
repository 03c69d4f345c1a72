//! CSV report adapter: one row per completed window.

use std::cell::RefCell;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::driver::WindowResult;
use crate::domain::error::RsitraderError;
use crate::domain::metrics::RunSummary;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 8] = [
    "window",
    "start",
    "end",
    "starting_balance",
    "final_balance",
    "profit_loss_pct",
    "bars",
    "trades",
];

pub struct CsvReportAdapter<W: Write> {
    writer: RefCell<csv::Writer<W>>,
}

impl CsvReportAdapter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, RsitraderError> {
        let file = File::create(path.as_ref()).map_err(|e| RsitraderError::Report {
            reason: format!("failed to create {}: {}", path.as_ref().display(), e),
        })?;
        Self::new(file)
    }
}

impl<W: Write> CsvReportAdapter<W> {
    pub fn new(out: W) -> Result<Self, RsitraderError> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(HEADER).map_err(report_error)?;
        Ok(Self {
            writer: RefCell::new(writer),
        })
    }

    pub fn into_inner(self) -> Result<W, RsitraderError> {
        self.writer
            .into_inner()
            .into_inner()
            .map_err(|e| RsitraderError::Report {
                reason: format!("failed to flush report: {}", e.error()),
            })
    }
}

fn report_error(e: csv::Error) -> RsitraderError {
    RsitraderError::Report {
        reason: format!("CSV write error: {}", e),
    }
}

impl<W: Write> ReportPort for CsvReportAdapter<W> {
    fn report(&self, result: &WindowResult) -> Result<(), RsitraderError> {
        self.writer
            .borrow_mut()
            .write_record([
                result.window_index.to_string(),
                result.start_timestamp.to_string(),
                result.end_timestamp.to_string(),
                format!("{:.6}", result.starting_balance),
                format!("{:.6}", result.final_balance),
                format!("{:.6}", result.profit_loss_ratio),
                result.bars.to_string(),
                result.trades.to_string(),
            ])
            .map_err(report_error)
    }

    fn finish(&self, _summary: &RunSummary) -> Result<(), RsitraderError> {
        self.writer.borrow_mut().flush()?;
        Ok(())
    }
}

/// Fans every call out to each inner sink in order.
pub struct MultiReport<'a> {
    sinks: Vec<&'a dyn ReportPort>,
}

impl<'a> MultiReport<'a> {
    pub fn new(sinks: Vec<&'a dyn ReportPort>) -> Self {
        Self { sinks }
    }
}

impl ReportPort for MultiReport<'_> {
    fn report(&self, result: &WindowResult) -> Result<(), RsitraderError> {
        self.sinks.iter().try_for_each(|s| s.report(result))
    }

    fn finish(&self, summary: &RunSummary) -> Result<(), RsitraderError> {
        self.sinks.iter().try_for_each(|s| s.finish(summary))
    }
}
