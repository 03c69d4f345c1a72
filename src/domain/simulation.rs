//! Single-window trade simulation.
//!
//! A window is replayed bar by bar. Each bar's RSI and close feed the pure
//! [`step`] function, which returns the next [`SimulationState`] and the
//! action taken, if any. After the last bar any holdings are liquidated at
//! the final close.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::domain::error::RsitraderError;
use crate::domain::indicator::RsiAccumulator;
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::strategy::StrategyParameters;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub balance: f64,
    pub holdings: f64,
}

impl SimulationState {
    pub fn new(starting_balance: f64) -> Self {
        SimulationState {
            balance: starting_balance,
            holdings: 0.0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.holdings == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

/// What a single step did to the state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Bought {
        quantity: f64,
        cash_amount: f64,
        fee: f64,
    },
    Sold {
        quantity: f64,
        proceeds: f64,
        fee: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub side: Side,
    pub price: f64,
    pub quantity: f64,
    /// Principal for a buy, net proceeds for a sell.
    pub cash_amount: f64,
    pub fee: f64,
    /// Set on the end-of-window liquidation.
    pub forced: bool,
}

impl Trade {
    fn from_action(bar_index: usize, bar: &OhlcvBar, action: Action, forced: bool) -> Self {
        let (side, quantity, cash_amount, fee) = match action {
            Action::Bought {
                quantity,
                cash_amount,
                fee,
            } => (Side::Buy, quantity, cash_amount, fee),
            Action::Sold {
                quantity,
                proceeds,
                fee,
            } => (Side::Sell, quantity, proceeds, fee),
        };
        Trade {
            bar_index,
            timestamp: bar.timestamp,
            side,
            price: bar.close,
            quantity,
            cash_amount,
            fee,
            forced,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSimulation {
    pub final_balance: f64,
    pub trades: Vec<Trade>,
}

fn check_price(price: f64) -> Result<(), RsitraderError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(RsitraderError::invalid_input(format!(
            "price must be positive, got {}",
            price
        )));
    }
    Ok(())
}

/// Sell all holdings at `price`, charging the fee on the proceeds.
pub fn liquidate(
    state: SimulationState,
    price: f64,
    fee_rate: f64,
) -> Result<(SimulationState, Option<Action>), RsitraderError> {
    if state.holdings <= 0.0 {
        return Ok((state, None));
    }
    check_price(price)?;
    let gross = state.holdings * price;
    let fee = gross * fee_rate;
    let proceeds = gross - fee;
    let next = SimulationState {
        balance: state.balance + proceeds,
        holdings: 0.0,
    };
    Ok((
        next,
        Some(Action::Sold {
            quantity: state.holdings,
            proceeds,
            fee,
        }),
    ))
}

/// Apply one bar's decision to `state`.
///
/// Buys only from Flat and only when the balance covers the trade amount plus
/// its fee; sells only from Long. An undefined RSI never trades.
pub fn step(
    state: SimulationState,
    price: f64,
    rsi: Option<f64>,
    params: &StrategyParameters,
) -> Result<(SimulationState, Option<Action>), RsitraderError> {
    check_price(price)?;
    let Some(rsi) = rsi else {
        return Ok((state, None));
    };

    if rsi < params.rsi_buy_threshold && state.is_flat() {
        let trade_amount = state.balance * params.trade_amount_ratio;
        let fee = trade_amount * params.fee_rate;
        let cost = trade_amount + fee;
        if trade_amount > 0.0 && state.balance >= trade_amount && state.balance >= cost {
            let quantity = trade_amount / price;
            let next = SimulationState {
                balance: state.balance - cost,
                holdings: state.holdings + quantity,
            };
            return Ok((
                next,
                Some(Action::Bought {
                    quantity,
                    cash_amount: trade_amount,
                    fee,
                }),
            ));
        }
    } else if rsi > params.rsi_sell_threshold && state.holdings > 0.0 {
        return liquidate(state, price, params.fee_rate);
    }

    Ok((state, None))
}

/// Replay `window` and return its final balance.
pub fn simulate(
    window: &[OhlcvBar],
    starting_balance: f64,
    params: &StrategyParameters,
) -> Result<f64, RsitraderError> {
    simulate_detailed(window, starting_balance, params).map(|sim| sim.final_balance)
}

/// Replay `window` and return the final balance together with the trade log.
pub fn simulate_detailed(
    window: &[OhlcvBar],
    starting_balance: f64,
    params: &StrategyParameters,
) -> Result<WindowSimulation, RsitraderError> {
    simulate_with_observer(window, starting_balance, params, |_, _| {})
}

/// Like [`simulate_detailed`], calling `observe(bar_index, state)` with the
/// state after every bar's decision.
pub fn simulate_with_observer<F>(
    window: &[OhlcvBar],
    starting_balance: f64,
    params: &StrategyParameters,
    mut observe: F,
) -> Result<WindowSimulation, RsitraderError>
where
    F: FnMut(usize, &SimulationState),
{
    params.validate()?;
    if !starting_balance.is_finite() || starting_balance < 0.0 {
        return Err(RsitraderError::invalid_input(format!(
            "starting balance must be non-negative, got {}",
            starting_balance
        )));
    }
    validate_series(window)?;

    let warmup = params.warmup_bars();
    if window.len() <= warmup {
        debug!(
            bars = window.len(),
            warmup, "window shorter than warm-up, no trades"
        );
        return Ok(WindowSimulation {
            final_balance: starting_balance,
            trades: Vec::new(),
        });
    }

    let mut rsi = RsiAccumulator::new(params.rsi_period)?;
    let mut state = SimulationState::new(starting_balance);
    let mut trades = Vec::new();

    for (i, bar) in window.iter().enumerate() {
        let value = rsi.push(bar.close);
        if i < warmup {
            continue;
        }
        let (next, action) = step(state, bar.close, value, params)?;
        if let Some(action) = action {
            debug!(bar = i, price = bar.close, rsi = ?value, ?action, "trade");
            trades.push(Trade::from_action(i, bar, action, false));
        }
        state = next;
        observe(i, &state);
    }

    let last_index = window.len() - 1;
    let last = &window[last_index];
    let (state, action) = liquidate(state, last.close, params.fee_rate)?;
    if let Some(action) = action {
        debug!(price = last.close, ?action, "forced liquidation at window end");
        trades.push(Trade::from_action(last_index, last, action, true));
    }

    Ok(WindowSimulation {
        final_balance: state.balance,
        trades,
    })
}
