//! Property-based tests for the indicator, simulator and driver.
//!
//! Uses proptest to verify:
//! 1. RSI bounds and idempotence
//! 2. RSI saturation on strictly rising prices
//! 3. Non-negative balance and holdings on every bar, flat at window end
//! 4. Short windows never trade
//! 5. Higher fees never help
//! 6. Two-window chains equal two chained manual simulations

mod common;

use chrono::Duration;
use common::*;
use proptest::prelude::*;
use rsitrader::domain::driver::{run, DriverConfig, WindowAdvance};
use rsitrader::domain::indicator::{compute_rsi, compute_rsi_closes};
use rsitrader::domain::ohlcv::slice_between;
use rsitrader::domain::simulation::{simulate, simulate_detailed, simulate_with_observer, Side};
use rsitrader::domain::strategy::StrategyParameters;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_prices(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.08..0.08_f64, min_len..max_len).prop_map(|steps| {
        let mut price = 100.0_f64;
        steps
            .into_iter()
            .map(|s| {
                price = (price * (1.0 + s)).max(0.01);
                (price * 100.0).round() / 100.0
            })
            .collect()
    })
}

fn arb_params() -> impl Strategy<Value = StrategyParameters> {
    (2usize..20, 0.01..=1.0_f64, 10.0..45.0_f64, 55.0..90.0_f64, 0.0..0.01_f64).prop_map(
        |(rsi_period, trade_amount_ratio, buy, sell, fee_rate)| StrategyParameters {
            rsi_period,
            trade_amount_ratio,
            rsi_buy_threshold: buy,
            rsi_sell_threshold: sell,
            fee_rate,
        },
    )
}

// ── 1-2. Indicator ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_within_bounds(prices in arb_prices(1, 200), period in 1usize..30) {
        for v in compute_rsi_closes(&prices, period).unwrap().into_iter().flatten() {
            prop_assert!((0.0..=100.0).contains(&v), "RSI {} out of range", v);
        }
    }

    #[test]
    fn rsi_is_idempotent(prices in arb_prices(1, 150), period in 1usize..30) {
        let bars = daily_bars(&prices);
        prop_assert_eq!(compute_rsi(&bars, period).unwrap(), compute_rsi(&bars, period).unwrap());
    }

    #[test]
    fn rsi_warmup_is_period_minus_one(prices in arb_prices(1, 100), period in 1usize..30) {
        let values = compute_rsi_closes(&prices, period).unwrap();
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(v.is_some(), i + 1 >= period);
        }
    }

    #[test]
    fn rising_prices_saturate(
        steps in prop::collection::vec(0.01..5.0_f64, 15..80),
        period in 1usize..15,
    ) {
        let mut price = 50.0;
        let prices: Vec<f64> = steps.iter().map(|s| { price += s; price }).collect();
        let values = compute_rsi_closes(&prices, period).unwrap();
        prop_assert_eq!(*values.last().unwrap(), Some(100.0));
    }
}

// ── 3-5. Simulator ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn balance_and_holdings_never_negative(
        prices in arb_prices(1, 200),
        params in arb_params(),
        balance in 1.0..1e7_f64,
    ) {
        let window = daily_bars(&prices);
        let mut ok = true;
        let sim = simulate_with_observer(&window, balance, &params, |_, s| {
            ok &= s.balance >= 0.0 && s.holdings >= 0.0;
        })
        .unwrap();
        prop_assert!(ok);
        prop_assert!(sim.final_balance >= 0.0);
    }

    #[test]
    fn window_always_ends_flat(prices in arb_prices(1, 200), params in arb_params()) {
        let sim = simulate_detailed(&daily_bars(&prices), 10_000.0, &params).unwrap();
        let bought: f64 = sim.trades.iter().filter(|t| t.side == Side::Buy).map(|t| t.quantity).sum();
        let sold: f64 = sim.trades.iter().filter(|t| t.side == Side::Sell).map(|t| t.quantity).sum();
        prop_assert!((bought - sold).abs() <= 1e-9 * bought.max(1.0));
        if let Some(last) = sim.trades.last() {
            prop_assert_eq!(last.side, Side::Sell);
        }
    }

    #[test]
    fn short_window_never_trades(params in arb_params(), balance in 0.0..1e7_f64) {
        let prices: Vec<f64> = (0..params.rsi_period).map(|i| 100.0 - i as f64).collect();
        let window = daily_bars(&prices);
        prop_assert_eq!(simulate(&window, balance, &params).unwrap(), balance);
    }

    #[test]
    fn higher_fee_never_helps(
        prices in arb_prices(20, 200),
        params in arb_params(),
        extra in 0.0001..0.05_f64,
    ) {
        // Keep ratio * (1 + fee) below 1 so neither run has to skip a buy.
        let params = StrategyParameters {
            trade_amount_ratio: params.trade_amount_ratio.min(0.9),
            ..params
        };
        let window = daily_bars(&prices);
        let low = simulate_detailed(&window, 10_000.0, &params).unwrap();
        let high_params = StrategyParameters { fee_rate: params.fee_rate + extra, ..params.clone() };
        let high = simulate(&window, 10_000.0, &high_params).unwrap();

        // Both runs see the same RSI path, so they trade on the same bars.
        if low.trades.is_empty() {
            prop_assert_eq!(high, low.final_balance);
        } else {
            prop_assert!(high < low.final_balance);
        }
    }
}

// ── 6. Driver ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn two_window_chain_matches_manual(
        prices in arb_prices(70, 150),
        params in arb_params(),
        days in 10i64..30,
    ) {
        let history = daily_bars(&prices);
        let cfg = DriverConfig {
            initial_balance: 1_000_000.0,
            num_windows: 2,
            window_length: Duration::days(days),
            advance: WindowAdvance::Calendar,
            params: params.clone(),
        };
        let results = run(&history, &cfg).unwrap();
        prop_assert_eq!(results.len(), 2);

        let d = days as usize;
        let first = slice_between(&history, history[0].timestamp, history[d].timestamp);
        let b1 = simulate(first, cfg.initial_balance, &params).unwrap();
        let second = slice_between(&history, history[d].timestamp, history[2 * d].timestamp);
        let b2 = simulate(second, b1, &params).unwrap();

        prop_assert_eq!(results[0].final_balance, b1);
        prop_assert_eq!(results[1].starting_balance, b1);
        prop_assert_eq!(results[1].final_balance, b2);
    }
}
