//! RSI threshold strategy parameters.

use crate::domain::error::RsitraderError;

pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_TRADE_AMOUNT_RATIO: f64 = 0.1;
pub const DEFAULT_RSI_BUY: f64 = 25.0;
pub const DEFAULT_RSI_SELL: f64 = 60.0;
pub const DEFAULT_FEE_RATE: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParameters {
    pub rsi_period: usize,
    /// Fraction of the current balance committed on each buy, in (0, 1].
    pub trade_amount_ratio: f64,
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    /// Proportional fee on the cash leg of buys and the proceeds of sells, in [0, 1).
    pub fee_rate: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        StrategyParameters {
            rsi_period: DEFAULT_RSI_PERIOD,
            trade_amount_ratio: DEFAULT_TRADE_AMOUNT_RATIO,
            rsi_buy_threshold: DEFAULT_RSI_BUY,
            rsi_sell_threshold: DEFAULT_RSI_SELL,
            fee_rate: DEFAULT_FEE_RATE,
        }
    }
}

impl StrategyParameters {
    pub fn validate(&self) -> Result<(), RsitraderError> {
        if self.rsi_period == 0 {
            return Err(RsitraderError::invalid_input("rsi_period must be at least 1"));
        }
        if !(self.trade_amount_ratio > 0.0 && self.trade_amount_ratio <= 1.0) {
            return Err(RsitraderError::invalid_input(format!(
                "trade_amount_ratio must be in (0, 1], got {}",
                self.trade_amount_ratio
            )));
        }
        if !(self.fee_rate >= 0.0 && self.fee_rate < 1.0) {
            return Err(RsitraderError::invalid_input(format!(
                "fee_rate must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if !self.rsi_buy_threshold.is_finite() || !self.rsi_sell_threshold.is_finite() {
            return Err(RsitraderError::invalid_input("RSI thresholds must be finite"));
        }
        Ok(())
    }

    /// Number of leading bars that never produce a trading decision.
    pub fn warmup_bars(&self) -> usize {
        self.rsi_period
    }
}
