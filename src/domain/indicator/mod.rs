//! Technical indicator implementations.

pub mod rsi;

pub use rsi::{compute_rsi, compute_rsi_closes, rsi_at, RsiAccumulator};
