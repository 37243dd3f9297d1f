//! Trade-set performance metrics.
//!
//! These four numbers are the only basis on which configurations are compared.

use crate::domain::trade::Trade;
use serde::{Deserialize, Serialize};

/// Floor for the P&L dispersion in the return ratio.
const STDDEV_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub count: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub return_ratio: f64,
    pub max_drawdown: f64,
}

impl Metrics {
    /// Aggregate `trades`, taken in the order given.
    pub fn compute(trades: &[Trade]) -> Self {
        let pnls: Vec<f64> = trades.iter().map(|t| t.record.pnl).collect();
        let wins = trades.iter().filter(|t| t.is_win()).count();
        Self::from_pnls(&pnls, wins)
    }

    fn from_pnls(pnls: &[f64], wins: usize) -> Self {
        if pnls.is_empty() {
            return Metrics::default();
        }

        let n = pnls.len() as f64;
        let total_pnl: f64 = pnls.iter().sum();
        let mean = total_pnl / n;
        let variance = pnls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        let stddev = variance.sqrt().max(STDDEV_EPSILON);

        Metrics {
            count: pnls.len(),
            win_rate: wins as f64 / n,
            total_pnl,
            return_ratio: mean / stddev,
            max_drawdown: compute_drawdown(pnls),
        }
    }

    /// Scalar score used to rank configurations during a grid search.
    pub fn objective(&self) -> f64 {
        100.0 * self.win_rate + self.total_pnl + 20.0 * self.return_ratio
            - 5.0 * self.max_drawdown
    }
}

/// Largest peak-to-trough drop of the cumulative P&L curve. The curve starts
/// at zero, so an opening loss counts as drawdown.
fn compute_drawdown(pnls: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;

    for pnl in pnls {
        cumulative += pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        max_dd = max_dd.max(peak - cumulative);
    }

    max_dd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter_config::FilterConfig;
    use crate::domain::side::Side;
    use crate::domain::trade::{ExitReason, NewTrade};
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn make_trade(id: i64, pnl_ticks: i64) -> Trade {
        let entry_time = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
            + chrono::Duration::minutes(id * 15);
        Trade {
            id,
            record: NewTrade {
                candidate_id: id,
                symbol: "ES".into(),
                timeframe: "5m".into(),
                side: Side::Long,
                entry_time,
                entry_price: 100.0,
                exit_time: entry_time + chrono::Duration::minutes(10),
                exit_price: 100.0 + pnl_ticks as f64 * 0.25,
                exit_reason: ExitReason::TimeCap,
                stop_price: 98.0,
                target_price: 104.0,
                position_size: 1,
                pnl: pnl_ticks as f64 * 0.25,
                pnl_ticks,
                mfe: 0.0,
                mae: 0.0,
                bars_held: 2,
                filter_config: FilterConfig::default(),
                score: 8.0,
            },
        }
    }

    fn make_trades(ticks: &[i64]) -> Vec<Trade> {
        ticks
            .iter()
            .enumerate()
            .map(|(i, &t)| make_trade(i as i64 + 1, t))
            .collect()
    }

    #[test]
    fn metrics_empty_set_is_all_zero() {
        assert_eq!(Metrics::compute(&[]), Metrics::default());
    }

    #[test]
    fn metrics_breakeven_counts_as_win() {
        let metrics = Metrics::compute(&make_trades(&[16, -8, 0, -8]));
        assert_eq!(metrics.count, 4);
        assert_relative_eq!(metrics.win_rate, 0.5);
        assert_relative_eq!(metrics.total_pnl, 0.0);
    }

    #[test]
    fn metrics_return_ratio_uses_population_stddev() {
        let metrics = Metrics::compute(&make_trades(&[16, -8]));
        // pnl 4.0 and -2.0: mean 1.0, population stddev 3.0
        assert_relative_eq!(metrics.return_ratio, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn metrics_constant_pnl_hits_epsilon_floor() {
        let metrics = Metrics::compute(&make_trades(&[4, 4, 4]));
        assert_relative_eq!(metrics.return_ratio, 1.0 / STDDEV_EPSILON, max_relative = 1e-9);
    }

    #[test]
    fn metrics_max_drawdown_from_cumulative_curve() {
        // cumulative: 10, 30, 10, 15, -5, 15
        let dd = compute_drawdown(&[10.0, 20.0, -20.0, 5.0, -20.0, 20.0]);
        assert_relative_eq!(dd, 35.0);
    }

    #[test]
    fn metrics_opening_loss_is_drawdown() {
        assert_relative_eq!(compute_drawdown(&[-3.0, 1.0]), 3.0);
    }

    #[test]
    fn metrics_drawdown_zero_for_monotone_gains() {
        assert_relative_eq!(compute_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn objective_weights_components() {
        let metrics = Metrics {
            count: 10,
            win_rate: 0.6,
            total_pnl: 12.5,
            return_ratio: 0.5,
            max_drawdown: 3.0,
        };
        assert_relative_eq!(metrics.objective(), 60.0 + 12.5 + 10.0 - 15.0);
    }

    proptest! {
        #[test]
        fn drawdown_is_never_negative(ticks in prop::collection::vec(-40i64..40, 1..100)) {
            let metrics = Metrics::compute(&make_trades(&ticks));
            prop_assert!(metrics.max_drawdown >= 0.0);
            prop_assert!((0.0..=1.0).contains(&metrics.win_rate));
        }
    }
}
