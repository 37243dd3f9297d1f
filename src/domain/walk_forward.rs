//! Walk-forward parameter search.
//!
//! One invocation moves through `TRAIN_BASELINE -> SEARCH -> TEST_VALIDATE ->
//! REPORT`, and optionally `APPROVE` when auto-approval is requested. A human
//! can approve or reject a report later through [`review`].

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::domain::error::BracketeerError;
use crate::domain::evaluation::WindowEvaluator;
use crate::domain::filter_config::FilterConfig;
use crate::domain::metrics::Metrics;
use crate::domain::report::{Approval, Comparison, NewReport, OptimizationReport, Reviewer};
use crate::domain::window::Split;
use crate::ports::filter_store_port::FilterStorePort;
use crate::ports::report_port::ReportPort;

pub const ACCEPTED_SIGNIFICANCE: f64 = 0.9;
pub const REJECTED_SIGNIFICANCE: f64 = 0.5;
pub const REJECTION_REASON: &str = "insufficient improvement on test window";

/// Score the baseline starts from; any eligible variant beats it.
const BASELINE_SCORE: f64 = -1e9;
const COMPARISON_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerSettings {
    pub train_days: i64,
    pub test_days: i64,
    /// Baseline trades below this force a train-window re-evaluation.
    pub min_trades: usize,
    pub min_eligible_trades: usize,
    /// Fraction of the baseline count a variant must reach.
    pub eligible_fraction: f64,
    /// Required test win-rate improvement, as a fraction.
    pub win_rate_margin: f64,
    /// Evaluate against a scratch journal instead of the shared one.
    pub isolated: bool,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        OptimizerSettings {
            train_days: 21,
            test_days: 7,
            min_trades: 50,
            min_eligible_trades: 20,
            eligible_fraction: 0.6,
            win_rate_margin: 0.03,
            isolated: false,
        }
    }
}

impl OptimizerSettings {
    /// Minimum trade count for a variant to be considered.
    pub fn eligibility_floor(&self, baseline_count: usize) -> usize {
        let scaled = (self.eligible_fraction * baseline_count as f64).floor() as usize;
        self.min_eligible_trades.max(scaled)
    }

    /// Both test-window conditions, inclusive at the boundary.
    pub fn accepts(&self, baseline: &Metrics, candidate: &Metrics) -> bool {
        candidate.win_rate + COMPARISON_TOLERANCE >= baseline.win_rate + self.win_rate_margin
            && candidate.total_pnl + COMPARISON_TOLERANCE >= baseline.total_pnl
    }
}

/// Best eligible variant found by the search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub config: FilterConfig,
    pub metrics: Metrics,
    pub score: f64,
    pub evaluated: usize,
    pub eligible: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    pub report_id: i64,
    pub report: NewReport,
    /// Set when the candidate configuration was promoted automatically.
    pub promoted_version: Option<i64>,
}

pub struct Optimizer<'a> {
    pub evaluator: &'a WindowEvaluator<'a>,
    pub filters: &'a dyn FilterStorePort,
    pub reports: &'a dyn ReportPort,
    pub settings: &'a OptimizerSettings,
}

impl Optimizer<'_> {
    /// Run one optimization whose test window ends at `as_of`.
    pub fn optimize(
        &self,
        seed: &FilterConfig,
        as_of: NaiveDateTime,
        auto_approve: bool,
    ) -> Result<OptimizationOutcome, BracketeerError> {
        let split = Split::ending_at(as_of, self.settings.train_days, self.settings.test_days);
        let active = self.filters.active_config(seed)?;

        info!(phase = "train_baseline", train = %split.train, test = %split.test, "optimizer phase");
        let old_train = self.train_baseline(&active, &split)?;

        info!(phase = "search", baseline_trades = old_train.count, "optimizer phase");
        let best = self.search(&active, &old_train, &split)?;

        info!(
            phase = "test_validate",
            evaluated = best.evaluated,
            eligible = best.eligible,
            score = best.score,
            "optimizer phase"
        );
        let old_test = self.evaluator.metrics(&active, &split.test)?;
        let new_test = self.evaluator.metrics(&best.config, &split.test)?;
        let accepted = self.settings.accepts(&old_test, &new_test);

        info!(phase = "report", accepted, auto_approve, "optimizer phase");
        let approval = match (accepted, auto_approve) {
            (true, true) => Approval {
                approved: Some(true),
                approved_by: Some(Reviewer::Auto),
                rejection_reason: None,
                reviewed_at: Some(now()),
            },
            (true, false) => Approval::pending(),
            (false, _) => Approval {
                approved: Some(false),
                approved_by: Some(Reviewer::Auto),
                rejection_reason: Some(REJECTION_REASON.into()),
                reviewed_at: Some(now()),
            },
        };

        let reasoning = format!(
            "train: baseline wr {:.3} pnl {:.2} vs candidate wr {:.3} pnl {:.2}; \
             test: baseline wr {:.3} pnl {:.2} vs candidate wr {:.3} pnl {:.2}; \
             {} of {} variants eligible",
            old_train.win_rate,
            old_train.total_pnl,
            best.metrics.win_rate,
            best.metrics.total_pnl,
            old_test.win_rate,
            old_test.total_pnl,
            new_test.win_rate,
            new_test.total_pnl,
            best.eligible,
            best.evaluated,
        );

        let scope = self.evaluator.scope();
        let report = NewReport {
            created_at: now(),
            split,
            symbols: scope.symbols.clone(),
            timeframes: scope.timeframes.clone(),
            old_config: active.clone(),
            new_config: best.config.clone(),
            train: Comparison {
                baseline: old_train,
                candidate: best.metrics,
            },
            test: Comparison {
                baseline: old_test,
                candidate: new_test,
            },
            accepted,
            significance: if accepted {
                ACCEPTED_SIGNIFICANCE
            } else {
                REJECTED_SIGNIFICANCE
            },
            reasoning,
            approval,
        };
        let report_id = self.reports.insert_report(&report)?;

        let promoted_version = if accepted && auto_approve {
            info!(phase = "approve", report_id, "auto-approving candidate configuration");
            let reason = format!("auto-approved optimization report #{}", report_id);
            Some(self.filters.promote(&best.config, &reason, Some(&new_test))?.version)
        } else {
            None
        };

        if !self.settings.isolated {
            // The search left the windows populated by whichever variant ran last.
            let current = self.filters.active_config(seed)?;
            self.evaluator.evaluate(&current, &split.train)?;
            self.evaluator.evaluate(&current, &split.test)?;
        }

        info!(report_id, accepted, "optimization finished");
        Ok(OptimizationOutcome {
            report_id,
            report,
            promoted_version,
        })
    }

    fn train_baseline(&self, active: &FilterConfig, split: &Split) -> Result<Metrics, BracketeerError> {
        let existing = Metrics::compute(&self.evaluator.existing_trades(&split.train)?);
        if existing.count >= self.settings.min_trades {
            return Ok(existing);
        }
        debug!(
            existing = existing.count,
            min_trades = self.settings.min_trades,
            "too few baseline trades, re-evaluating train window"
        );
        self.evaluator.metrics(active, &split.train)
    }

    /// Evaluate every neighbour on the train window and keep the best
    /// eligible one. Ties keep the earlier winner.
    pub fn search(
        &self,
        active: &FilterConfig,
        baseline: &Metrics,
        split: &Split,
    ) -> Result<SearchResult, BracketeerError> {
        let floor = self.settings.eligibility_floor(baseline.count);
        let mut best = SearchResult {
            config: active.clone(),
            metrics: *baseline,
            score: BASELINE_SCORE,
            evaluated: 0,
            eligible: 0,
        };

        for variant in active.neighbours() {
            let metrics = self.evaluator.metrics(&variant, &split.train)?;
            best.evaluated += 1;
            if metrics.count < floor {
                continue;
            }
            best.eligible += 1;
            let score = metrics.objective();
            if score > best.score {
                best.config = variant;
                best.metrics = metrics;
                best.score = score;
            }
        }

        Ok(best)
    }
}

/// Record a human decision on report `id`; approval promotes its candidate
/// configuration.
pub fn review(
    reports: &dyn ReportPort,
    filters: &dyn FilterStorePort,
    id: i64,
    approve: bool,
    reason: Option<&str>,
) -> Result<OptimizationReport, BracketeerError> {
    let mut report = reports
        .report(id)?
        .ok_or(BracketeerError::ReportNotFound { id })?;
    report.ensure_reviewable()?;

    let approval = Approval {
        approved: Some(approve),
        approved_by: Some(Reviewer::Human),
        rejection_reason: if approve {
            None
        } else {
            Some(reason.unwrap_or("rejected by reviewer").to_string())
        },
        reviewed_at: Some(now()),
    };
    reports.record_review(id, &approval)?;

    if approve {
        let default_reason = format!("approved optimization report #{}", id);
        let promoted = filters.promote(
            &report.record.new_config,
            reason.unwrap_or(&default_reason),
            Some(&report.record.test.candidate),
        )?;
        info!(report_id = id, version = promoted.version, "configuration promoted");
    } else {
        info!(report_id = id, "report rejected");
    }

    report.record.approval = approval;
    Ok(report)
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(count: usize, win_rate: f64, total_pnl: f64) -> Metrics {
        Metrics {
            count,
            win_rate,
            total_pnl,
            return_ratio: 0.0,
            max_drawdown: 0.0,
        }
    }

    #[test]
    fn exact_margin_improvement_with_flat_pnl_is_accepted() {
        let settings = OptimizerSettings::default();
        let baseline = metrics(100, 0.50, 12.0);
        let candidate = metrics(100, 0.53, 12.0);
        assert!(settings.accepts(&baseline, &candidate));
    }

    #[test]
    fn acceptance_needs_both_conditions() {
        let settings = OptimizerSettings::default();
        let baseline = metrics(100, 0.50, 12.0);
        assert!(!settings.accepts(&baseline, &metrics(100, 0.529, 20.0)));
        assert!(!settings.accepts(&baseline, &metrics(100, 0.60, 11.75)));
        assert!(settings.accepts(&baseline, &metrics(40, 0.60, 12.25)));
    }

    #[test]
    fn eligibility_floor_uses_larger_bound() {
        let settings = OptimizerSettings::default();
        assert_eq!(settings.eligibility_floor(0), 20);
        assert_eq!(settings.eligibility_floor(30), 20);
        assert_eq!(settings.eligibility_floor(50), 30);
        assert_eq!(settings.eligibility_floor(101), 60);
    }
}
