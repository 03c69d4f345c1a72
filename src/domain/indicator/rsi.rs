//! RSI (Relative Strength Index) indicator.
//!
//! Gains and losses are smoothed with an adjusted exponentially weighted mean
//! (centre of mass `period - 1`, so alpha = 1/period):
//!
//! ```text
//! mean_t = sum_i (1 - alpha)^i * x[t - i] / sum_i (1 - alpha)^i
//! ```
//!
//! The first bar has no previous close and contributes a zero gain and a zero
//! loss. A value is defined once `period` bars have been observed, i.e. from
//! index `period - 1`.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, unless avg_gain == 0 as well (flat), then 50.

use crate::domain::error::RsitraderError;
use crate::domain::ohlcv::OhlcvBar;

pub const RSI_MAX: f64 = 100.0;
pub const RSI_NEUTRAL: f64 = 50.0;

/// Running state of the RSI recurrence. Feeding closes one at a time yields
/// exactly what [`compute_rsi`] returns for the same prefix.
#[derive(Debug, Clone)]
pub struct RsiAccumulator {
    period: usize,
    decay: f64,
    gain_sum: f64,
    loss_sum: f64,
    weight_sum: f64,
    prev_close: Option<f64>,
    observations: usize,
}

impl RsiAccumulator {
    pub fn new(period: usize) -> Result<Self, RsitraderError> {
        if period == 0 {
            return Err(RsitraderError::invalid_input("RSI period must be at least 1"));
        }
        Ok(RsiAccumulator {
            period,
            decay: 1.0 - 1.0 / period as f64,
            gain_sum: 0.0,
            loss_sum: 0.0,
            weight_sum: 0.0,
            prev_close: None,
            observations: 0,
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Observe the next close and return the RSI as of that bar.
    pub fn push(&mut self, close: f64) -> Option<f64> {
        let change = self.prev_close.map_or(0.0, |prev| close - prev);
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        self.gain_sum = gain + self.decay * self.gain_sum;
        self.loss_sum = loss + self.decay * self.loss_sum;
        self.weight_sum = 1.0 + self.decay * self.weight_sum;
        self.prev_close = Some(close);
        self.observations += 1;

        self.value()
    }

    /// Current RSI, or `None` while still warming up.
    pub fn value(&self) -> Option<f64> {
        if self.observations < self.period {
            return None;
        }
        let avg_gain = self.gain_sum / self.weight_sum;
        let avg_loss = self.loss_sum / self.weight_sum;
        Some(rsi_from_averages(avg_gain, avg_loss))
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 { RSI_NEUTRAL } else { RSI_MAX }
    } else {
        RSI_MAX - (RSI_MAX / (1.0 + avg_gain / avg_loss))
    }
}

pub fn compute_rsi_closes(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, RsitraderError> {
    let mut acc = RsiAccumulator::new(period)?;
    Ok(closes.iter().map(|&c| acc.push(c)).collect())
}

pub fn compute_rsi(bars: &[OhlcvBar], period: usize) -> Result<Vec<Option<f64>>, RsitraderError> {
    let mut acc = RsiAccumulator::new(period)?;
    Ok(bars.iter().map(|b| acc.push(b.close)).collect())
}

/// RSI as of the last bar of `bars`.
pub fn rsi_at(bars: &[OhlcvBar], period: usize) -> Result<Option<f64>, RsitraderError> {
    let mut acc = RsiAccumulator::new(period)?;
    let mut last = None;
    for bar in bars {
        last = acc.push(bar.close);
    }
    Ok(last)
}
