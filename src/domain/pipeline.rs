//! Batch stages: detect, score, execute, label.
//!
//! Each stage is a sequential pass that commits one record at a time, so an
//! interrupted run resumes where it stopped: downstream stages only pick up
//! inputs that have not been processed yet. Per-record failures are logged
//! and counted; store failures abort the stage.

use tracing::{debug, info, warn};

use crate::domain::candidate::Candidate;
use crate::domain::detector;
use crate::domain::error::BracketeerError;
use crate::domain::execution::{ExecutionSettings, build_trade};
use crate::domain::filter_config::FilterConfig;
use crate::domain::label::label_trade;
use crate::domain::scope::Scope;
use crate::domain::summary::BatchSummary;
use crate::domain::window::TimeWindow;
use crate::ports::candle_port::CandlePort;
use crate::ports::decision_port::DecisionPort;
use crate::ports::journal_port::{ExecutionQuery, JournalPort};

/// Counts from a full detect → score → execute → label pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub detected: BatchSummary,
    pub scored: BatchSummary,
    pub executed: BatchSummary,
    pub labeled: BatchSummary,
}

/// The collaborators every stage works against.
pub struct Pipeline<'a> {
    pub candles: &'a dyn CandlePort,
    pub journal: &'a dyn JournalPort,
    pub scorer: &'a dyn DecisionPort,
    pub settings: &'a ExecutionSettings,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        candles: &'a dyn CandlePort,
        journal: &'a dyn JournalPort,
        scorer: &'a dyn DecisionPort,
        settings: &'a ExecutionSettings,
    ) -> Self {
        Pipeline {
            candles,
            journal,
            scorer,
            settings,
        }
    }

    /// Scan one series and persist every new candidate as it is found.
    pub fn detect(
        &self,
        symbol: &str,
        timeframe: &str,
        config: &FilterConfig,
        window: Option<&TimeWindow>,
    ) -> Result<BatchSummary, BracketeerError> {
        let bars = self.candles.get_bars(symbol, timeframe, None, None)?;
        if bars.is_empty() {
            debug!(symbol, timeframe, "no bars to scan");
            return Ok(BatchSummary::default());
        }

        let journal = self.journal;
        let summary = detector::scan(&bars, config, window, |setup| {
            Ok(journal.insert_candidate(&setup)?.is_some())
        })?;

        info!(symbol, timeframe, emitted = summary.processed, skipped = summary.skipped, "detect finished");
        Ok(summary)
    }

    /// Attach a decision to every unscored candidate in scope.
    pub fn score(
        &self,
        scope: &Scope,
        window: Option<&TimeWindow>,
    ) -> Result<BatchSummary, BracketeerError> {
        let mut summary = BatchSummary::default();

        for candidate in self.journal.unscored_candidates(scope, window)? {
            let outcome = self
                .scorer
                .score(&candidate)
                .and_then(|decision| self.journal.record_decision(candidate.id, &decision));
            match outcome {
                Ok(()) => summary.processed += 1,
                Err(e) if e.is_per_record() => {
                    warn!(candidate_id = candidate.id, error = %e, "candidate left unscored");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(scored = summary.processed, skipped = summary.skipped, "score finished");
        Ok(summary)
    }

    /// Simulate every eligible candidate in ascending time order.
    pub fn execute(
        &self,
        scope: &Scope,
        config: &FilterConfig,
        window: Option<&TimeWindow>,
    ) -> Result<BatchSummary, BracketeerError> {
        let query = ExecutionQuery {
            scope,
            min_score: self.settings.score_threshold,
            window,
        };
        let mut summary = BatchSummary::default();

        for candidate in self.journal.executable_candidates(&query)? {
            match self.execute_one(&candidate, config) {
                Ok(trade_id) => {
                    debug!(candidate_id = candidate.id, trade_id, "trade recorded");
                    summary.processed += 1;
                }
                Err(BracketeerError::DataGap { candidate_id }) => {
                    debug!(candidate_id, "not enough bars yet, deferred");
                    summary.deferred += 1;
                }
                Err(e) if e.is_per_record() => {
                    warn!(candidate_id = candidate.id, error = %e, "candidate skipped");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            executed = summary.processed,
            deferred = summary.deferred,
            skipped = summary.skipped,
            "execute finished"
        );
        Ok(summary)
    }

    fn execute_one(&self, candidate: &Candidate, config: &FilterConfig) -> Result<i64, BracketeerError> {
        let (side, score) = match (
            candidate.executable_side(self.settings.score_threshold),
            candidate.decision.as_ref(),
        ) {
            (Some(side), Some(decision)) => (side, decision.score),
            _ => {
                return Err(BracketeerError::DecisionUnavailable {
                    candidate_id: candidate.id,
                    reason: "no executable direction".into(),
                });
            }
        };

        let setup = &candidate.setup;
        let bars = self.candles.bars_after(
            &setup.symbol,
            &setup.timeframe,
            setup.timestamp,
            self.settings.bracket.max_hold_bars.max(1),
        )?;
        let trade = build_trade(candidate, side, score, &bars, self.settings, config)?;
        self.journal.insert_trade(&trade)
    }

    /// Label every trade that has no label yet.
    pub fn label(&self) -> Result<BatchSummary, BracketeerError> {
        let mut summary = BatchSummary::default();

        for trade in self.journal.unlabeled_trades()? {
            let candidate = self.journal.candidate(trade.record.candidate_id)?;
            let entry_atr = match &candidate {
                Some(c) => self
                    .candles
                    .bar_by_id(c.setup.bar_id)?
                    .and_then(|bar| bar.indicators.atr)
                    .or(c.setup.indicators.atr),
                None => None,
            };

            let label = label_trade(&trade, candidate.as_ref(), entry_atr);
            match self.journal.insert_label(&label) {
                Ok(_) => summary.processed += 1,
                Err(e) if e.is_per_record() => {
                    warn!(trade_id = trade.id, error = %e, "trade skipped");
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(labeled = summary.processed, "label finished");
        Ok(summary)
    }

    /// Detect over every series in scope, then score, execute and label.
    pub fn run(&self, scope: &Scope, config: &FilterConfig) -> Result<RunSummary, BracketeerError> {
        let mut detected = BatchSummary::default();
        for (symbol, timeframe) in scope.pairs() {
            detected += self.detect(symbol, timeframe, config, None)?;
        }
        let scored = self.score(scope, None)?;
        let executed = self.execute(scope, config, None)?;
        let labeled = self.label()?;

        Ok(RunSummary {
            detected,
            scored,
            executed,
            labeled,
        })
    }
}
