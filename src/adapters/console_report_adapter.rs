//! Console report adapter: one line per window and a closing total on stdout.

use std::cell::RefCell;
use std::io::Write;

use crate::domain::driver::WindowResult;
use crate::domain::error::RsitraderError;
use crate::domain::metrics::RunSummary;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct ConsoleReportAdapter<W: Write> {
    out: RefCell<W>,
    currency: String,
}

impl ConsoleReportAdapter<std::io::Stdout> {
    pub fn stdout(currency: impl Into<String>) -> Self {
        Self::new(std::io::stdout(), currency)
    }
}

impl<W: Write> ConsoleReportAdapter<W> {
    pub fn new(out: W, currency: impl Into<String>) -> Self {
        Self {
            out: RefCell::new(out),
            currency: currency.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn amount(&self, value: f64) -> String {
        if self.currency.is_empty() {
            format!("{:.2}", value)
        } else {
            format!("{:.2} {}", value, self.currency)
        }
    }
}

pub fn format_window_line(result: &WindowResult, amount: &str) -> String {
    format!(
        "Simulation {}: Start Date: {}, End Date: {}, Profit/Loss Ratio: {:.2}%, Final Balance: {}",
        result.window_index,
        result.start_timestamp.format(TIMESTAMP_FORMAT),
        result.end_timestamp.format(TIMESTAMP_FORMAT),
        result.profit_loss_ratio,
        amount,
    )
}

impl<W: Write> ReportPort for ConsoleReportAdapter<W> {
    fn report(&self, result: &WindowResult) -> Result<(), RsitraderError> {
        let line = format_window_line(result, &self.amount(result.final_balance));
        writeln!(self.out.borrow_mut(), "{}", line)?;
        Ok(())
    }

    fn finish(&self, summary: &RunSummary) -> Result<(), RsitraderError> {
        let mut out = self.out.borrow_mut();
        writeln!(
            out,
            "Total Final Balance after {} simulations: {}",
            summary.windows_requested,
            self.amount(summary.final_balance)
        )?;
        writeln!(
            out,
            "Total Return: {:.2}%  Mean Window: {:.2}%  Best: {:.2}%  Worst: {:.2}%  Won/Lost: {}/{}  Trades: {}",
            summary.total_return,
            summary.mean_window_return,
            summary.best_window_return,
            summary.worst_window_return,
            summary.windows_won,
            summary.windows_lost,
            summary.total_trades,
        )?;
        out.flush()?;
        Ok(())
    }
}
