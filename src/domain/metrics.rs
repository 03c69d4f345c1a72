//! Aggregate statistics over a chain of window results.

use super::driver::WindowResult;

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub windows_requested: usize,
    pub windows_completed: usize,
    pub initial_balance: f64,
    /// Last window's final balance, or the initial balance if none completed.
    pub final_balance: f64,
    /// Percent change from initial to final balance.
    pub total_return: f64,
    pub mean_window_return: f64,
    pub best_window_return: f64,
    pub worst_window_return: f64,
    pub windows_won: usize,
    pub windows_lost: usize,
    pub total_trades: usize,
}

impl RunSummary {
    pub fn compute(results: &[WindowResult], initial_balance: f64, windows_requested: usize) -> Self {
        let final_balance = results
            .last()
            .map(|r| r.final_balance)
            .unwrap_or(initial_balance);

        let total_return = if initial_balance > 0.0 {
            (final_balance - initial_balance) / initial_balance * 100.0
        } else {
            0.0
        };

        let mut sum = 0.0_f64;
        let mut best = f64::NEG_INFINITY;
        let mut worst = f64::INFINITY;
        let mut windows_won = 0usize;
        let mut windows_lost = 0usize;
        let mut total_trades = 0usize;

        for r in results {
            let ratio = r.profit_loss_ratio;
            sum += ratio;
            best = best.max(ratio);
            worst = worst.min(ratio);
            if ratio > 0.0 {
                windows_won += 1;
            } else if ratio < 0.0 {
                windows_lost += 1;
            }
            total_trades += r.trades;
        }

        let (mean_window_return, best_window_return, worst_window_return) = if results.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (sum / results.len() as f64, best, worst)
        };

        RunSummary {
            windows_requested,
            windows_completed: results.len(),
            initial_balance,
            final_balance,
            total_return,
            mean_window_return,
            best_window_return,
            worst_window_return,
            windows_won,
            windows_lost,
            total_trades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn window(index: usize, start: f64, end: f64, trades: usize) -> WindowResult {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::days(30 * (index as i64 - 1));
        WindowResult {
            window_index: index,
            start_timestamp: ts,
            end_timestamp: ts + Duration::days(30),
            starting_balance: start,
            final_balance: end,
            profit_loss_ratio: (end - start) / start * 100.0,
            bars: 31,
            trades,
        }
    }

    #[test]
    fn empty_results_keep_initial_balance() {
        let s = RunSummary::compute(&[], 1_000_000.0, 30);
        assert_eq!(s.final_balance, 1_000_000.0);
        assert_eq!(s.windows_completed, 0);
        assert_eq!(s.windows_requested, 30);
        assert_eq!(s.total_return, 0.0);
        assert_eq!(s.mean_window_return, 0.0);
        assert_eq!(s.best_window_return, 0.0);
        assert_eq!(s.worst_window_return, 0.0);
    }

    #[test]
    fn summary_over_chain() {
        let results = vec![
            window(1, 1000.0, 1100.0, 2),
            window(2, 1100.0, 990.0, 4),
            window(3, 990.0, 990.0, 0),
        ];
        let s = RunSummary::compute(&results, 1000.0, 5);

        assert_eq!(s.windows_completed, 3);
        assert_eq!(s.final_balance, 990.0);
        assert_relative_eq!(s.total_return, -1.0, max_relative = 1e-12);
        assert_relative_eq!(s.best_window_return, 10.0, max_relative = 1e-12);
        assert_relative_eq!(s.worst_window_return, -10.0, max_relative = 1e-12);
        assert_relative_eq!(s.mean_window_return, 0.0, epsilon = 1e-12);
        assert_eq!(s.windows_won, 1);
        assert_eq!(s.windows_lost, 1);
        assert_eq!(s.total_trades, 6);
    }
}
