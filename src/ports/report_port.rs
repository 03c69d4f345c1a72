//! Result reporting port.

use crate::domain::driver::WindowResult;
use crate::domain::error::RsitraderError;
use crate::domain::metrics::RunSummary;

/// Sink for backtest output. `report` is called once per completed window,
/// in order; `finish` once after the chain ends.
pub trait ReportPort {
    fn report(&self, result: &WindowResult) -> Result<(), RsitraderError>;

    /// Default implementation: nothing to flush.
    fn finish(&self, _summary: &RunSummary) -> Result<(), RsitraderError> {
        Ok(())
    }
}
