//! Rolling walk-forward backtest.
//!
//! Replays the window re-evaluation over `steps` consecutive (train, test)
//! folds, oldest first, the last fold's test window ending at `end`.

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info};

use crate::domain::error::BracketeerError;
use crate::domain::evaluation::WindowEvaluator;
use crate::domain::filter_config::FilterConfig;
use crate::domain::metrics::Metrics;
use crate::domain::window::Split;
use crate::ports::candle_port::CandlePort;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub train_days: i64,
    pub test_days: i64,
    pub steps: usize,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fold {
    pub split: Split,
    pub train: Metrics,
    pub test: Metrics,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BacktestResult {
    pub folds: Vec<Fold>,
    /// Folds skipped for lack of bars.
    pub skipped: usize,
    pub avg_train_win_rate: f64,
    pub avg_test_win_rate: f64,
    pub total_test_pnl: f64,
}

impl BacktestResult {
    fn from_folds(folds: Vec<Fold>, skipped: usize) -> Self {
        if folds.is_empty() {
            return BacktestResult {
                skipped,
                ..BacktestResult::default()
            };
        }
        let n = folds.len() as f64;
        BacktestResult {
            avg_train_win_rate: folds.iter().map(|f| f.train.win_rate).sum::<f64>() / n,
            avg_test_win_rate: folds.iter().map(|f| f.test.win_rate).sum::<f64>() / n,
            total_test_pnl: folds.iter().map(|f| f.test.total_pnl).sum(),
            folds,
            skipped,
        }
    }
}

/// Split for each fold, oldest first.
pub fn fold_splits(config: &BacktestConfig) -> Vec<Split> {
    let span = Duration::days(config.train_days + config.test_days);
    (0..config.steps)
        .rev()
        .map(|j| {
            let test_end = config.end - span * j as i32;
            Split::ending_at(test_end, config.train_days, config.test_days)
        })
        .collect()
}

pub fn run_backtest(
    evaluator: &WindowEvaluator<'_>,
    candles: &dyn CandlePort,
    filter_config: &FilterConfig,
    config: &BacktestConfig,
) -> Result<BacktestResult, BracketeerError> {
    let mut folds = Vec::new();
    let mut skipped = 0;

    for split in fold_splits(config) {
        if !has_coverage(evaluator, candles, &split)? {
            debug!(fold = %split.span(), "no bars in fold, skipping");
            skipped += 1;
            continue;
        }

        let train = evaluator.metrics(filter_config, &split.train)?;
        let test = evaluator.metrics(filter_config, &split.test)?;
        info!(
            fold = %split.span(),
            train_trades = train.count,
            test_trades = test.count,
            test_pnl = test.total_pnl,
            "fold evaluated"
        );
        folds.push(Fold { split, train, test });
    }

    Ok(BacktestResult::from_folds(folds, skipped))
}

fn has_coverage(
    evaluator: &WindowEvaluator<'_>,
    candles: &dyn CandlePort,
    split: &Split,
) -> Result<bool, BracketeerError> {
    let span = split.span();
    for (symbol, timeframe) in evaluator.scope().pairs() {
        if candles.has_bars_in(symbol, timeframe, &span)? {
            return Ok(true);
        }
    }
    Ok(false)
}
