//! Configuration validation.
//!
//! Checks every `[data]`, `[backtest]` and `[strategy]` key before a run so a
//! bad value fails fast instead of silently falling back to a default.

use crate::domain::error::RsitraderError;
use crate::ports::config_port::ConfigPort;
use chrono::{Duration, NaiveDate};
use tracing::warn;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), RsitraderError> {
    validate_data_config(config)?;
    validate_backtest_config(config)?;
    validate_strategy_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), RsitraderError> {
    config.require_string("data", "symbol")?;
    config.require_string("data", "interval")?;
    validate_dates(config)?;
    if let Some(page) = parse_integer(config, "data", "page_size")? {
        if page < 1 {
            return Err(invalid("data", "page_size", "page_size must be a positive integer"));
        }
    }
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), RsitraderError> {
    if let Some(balance) = parse_number(config, "backtest", "initial_balance")? {
        if balance <= 0.0 {
            return Err(invalid(
                "backtest",
                "initial_balance",
                "initial_balance must be positive",
            ));
        }
    }
    if let Some(n) = parse_integer(config, "backtest", "num_windows")? {
        if n < 0 {
            return Err(invalid(
                "backtest",
                "num_windows",
                "num_windows must be a non-negative integer",
            ));
        }
    }
    if let Some(days) = parse_integer(config, "backtest", "window_days")? {
        if days < 1 {
            return Err(invalid(
                "backtest",
                "window_days",
                "window_days must be a positive integer",
            ));
        }
        if Duration::try_days(days).is_none() {
            return Err(invalid("backtest", "window_days", "window_days is out of range"));
        }
    }
    if let Some(advance) = config.get_string("backtest", "window_advance") {
        match advance.trim().to_lowercase().as_str() {
            "calendar" | "bars" => {}
            _ => {
                return Err(invalid(
                    "backtest",
                    "window_advance",
                    "window_advance must be 'calendar' or 'bars'",
                ));
            }
        }
    }
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), RsitraderError> {
    if let Some(period) = parse_integer(config, "strategy", "rsi_period")? {
        if period < 1 {
            return Err(invalid(
                "strategy",
                "rsi_period",
                "rsi_period must be a positive integer",
            ));
        }
    }
    if let Some(ratio) = parse_number(config, "strategy", "trade_amount_ratio")? {
        if ratio <= 0.0 || ratio > 1.0 {
            return Err(invalid(
                "strategy",
                "trade_amount_ratio",
                "trade_amount_ratio must be in (0, 1]",
            ));
        }
    }
    if let Some(fee) = parse_number(config, "strategy", "fee_rate")? {
        if !(0.0..1.0).contains(&fee) {
            return Err(invalid("strategy", "fee_rate", "fee_rate must be in [0, 1)"));
        }
    }
    let buy = parse_number(config, "strategy", "rsi_buy")?;
    let sell = parse_number(config, "strategy", "rsi_sell")?;
    for (key, value) in [("rsi_buy", buy), ("rsi_sell", sell)] {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                return Err(invalid("strategy", key, "RSI thresholds must be in [0, 100]"));
            }
        }
    }
    if let (Some(buy), Some(sell)) = (buy, sell) {
        if buy >= sell {
            warn!(buy, sell, "rsi_buy is not below rsi_sell");
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), RsitraderError> {
    let start = parse_date(config, "start_date")?;
    let end = parse_date(config, "end_date")?;
    if start > end {
        return Err(invalid(
            "data",
            "start_date",
            "start_date must not be after end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(config: &dyn ConfigPort, key: &str) -> Result<NaiveDate, RsitraderError> {
    let value = config.require_string("data", key)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
        invalid(
            "data",
            key,
            &format!("invalid {} format, expected YYYY-MM-DD", key),
        )
    })
}

/// `Ok(None)` when the key is absent; `ConfigInvalid` when present but not a
/// finite number.
fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, RsitraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(invalid(section, key, &format!("{:?} is not a number", raw))),
        },
    }
}

/// Integer keys follow the parsing rules of `ConfigPort::get_int`: `7.0` is
/// not an integer.
fn parse_integer(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<i64>, RsitraderError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("{:?} is not an integer", raw))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> RsitraderError {
    RsitraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
