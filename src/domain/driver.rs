//! Multi-window backtest driver.
//!
//! Partitions a price history into sequential fixed-length windows and runs
//! the single-window simulator on each, carrying every window's final
//! balance into the next.

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::domain::error::RsitraderError;
use crate::domain::ohlcv::{slice_between, validate_series, OhlcvBar};
use crate::domain::simulation::simulate_detailed;
use crate::domain::strategy::StrategyParameters;

/// How the cursor moves from one window's first bar to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAdvance {
    /// Skip a fixed number of bars. Lines up with elapsed time only when the
    /// history has exactly one bar per `window_length / n`.
    Bars(usize),
    /// Move to the first bar at or after the current window's end timestamp.
    Calendar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverConfig {
    pub initial_balance: f64,
    pub num_windows: usize,
    pub window_length: Duration,
    pub advance: WindowAdvance,
    pub params: StrategyParameters,
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), RsitraderError> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(RsitraderError::invalid_input(format!(
                "initial balance must be positive, got {}",
                self.initial_balance
            )));
        }
        if self.window_length <= Duration::zero() {
            return Err(RsitraderError::invalid_input("window length must be positive"));
        }
        if self.advance == WindowAdvance::Bars(0) {
            return Err(RsitraderError::invalid_input("bar advance must be at least 1"));
        }
        self.params.validate()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    /// 1-based position in the chain.
    pub window_index: usize,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub starting_balance: f64,
    pub final_balance: f64,
    /// Percent change over the window.
    pub profit_loss_ratio: f64,
    pub bars: usize,
    pub trades: usize,
}

fn next_cursor(
    history: &[OhlcvBar],
    cursor: usize,
    end: NaiveDateTime,
    advance: WindowAdvance,
) -> usize {
    match advance {
        WindowAdvance::Bars(n) => cursor.saturating_add(n),
        WindowAdvance::Calendar => {
            let next = history.partition_point(|b| b.timestamp < end);
            // A window must always move the cursor forward.
            next.max(cursor + 1)
        }
    }
}

/// Run the window chain and collect every completed window.
pub fn run(history: &[OhlcvBar], config: &DriverConfig) -> Result<Vec<WindowResult>, RsitraderError> {
    run_with(history, config, |_| Ok(()))
}

/// Run the window chain, handing each result to `on_window` as soon as its
/// window completes. An error from the callback aborts the run.
pub fn run_with<F>(
    history: &[OhlcvBar],
    config: &DriverConfig,
    mut on_window: F,
) -> Result<Vec<WindowResult>, RsitraderError>
where
    F: FnMut(&WindowResult) -> Result<(), RsitraderError>,
{
    config.validate()?;
    validate_series(history)?;

    let mut results = Vec::new();
    let Some(last) = history.last() else {
        info!("empty history, no windows to run");
        return Ok(results);
    };
    let last_timestamp = last.timestamp;

    let mut cursor = 0usize;
    let mut balance = config.initial_balance;

    for window_index in 1..=config.num_windows {
        let Some(start_bar) = history.get(cursor) else {
            debug!(window_index, cursor, "cursor past end of history");
            break;
        };
        let start = start_bar.timestamp;
        let Some(end) = start
            .checked_add_signed(config.window_length)
            .filter(|end| *end <= last_timestamp)
        else {
            debug!(window_index, %start, %last_timestamp, "window exceeds available history");
            break;
        };
        cursor = next_cursor(history, cursor, end, config.advance);

        let window = slice_between(history, start, end);
        let sim = simulate_detailed(window, balance, &config.params)?;
        let profit_loss_ratio = (sim.final_balance - balance) / balance * 100.0;

        let result = WindowResult {
            window_index,
            start_timestamp: start,
            end_timestamp: end,
            starting_balance: balance,
            final_balance: sim.final_balance,
            profit_loss_ratio,
            bars: window.len(),
            trades: sim.trades.len(),
        };
        debug!(
            window_index,
            bars = result.bars,
            trades = result.trades,
            profit_loss_ratio,
            "window complete"
        );
        on_window(&result)?;

        balance = sim.final_balance;
        results.push(result);
    }

    info!(
        completed = results.len(),
        requested = config.num_windows,
        final_balance = balance,
        "backtest finished"
    );
    Ok(results)
}
