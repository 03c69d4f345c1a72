//! Core domain types and logic.

pub mod config_validation;
pub mod driver;
pub mod error;
pub mod history;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod simulation;
pub mod strategy;
