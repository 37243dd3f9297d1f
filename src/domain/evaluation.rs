//! Window re-evaluation.
//!
//! Evaluating a window under a configuration purges the window's candidates
//! (with their trades and labels) for the selected series, re-runs detection,
//! scoring and execution restricted to the window, and reads back the trades
//! entered inside it. Repeating a call with the same configuration yields the
//! same trades. Against a shared journal the purge is destructive, so callers
//! must not evaluate overlapping windows concurrently; pass a
//! `MemoryJournal` to evaluate in isolation.

use tracing::debug;

use crate::domain::error::BracketeerError;
use crate::domain::filter_config::FilterConfig;
use crate::domain::metrics::Metrics;
use crate::domain::pipeline::Pipeline;
use crate::domain::scope::Scope;
use crate::domain::trade::Trade;
use crate::domain::window::TimeWindow;

pub struct WindowEvaluator<'a> {
    pipeline: Pipeline<'a>,
    scope: &'a Scope,
}

impl<'a> WindowEvaluator<'a> {
    pub fn new(pipeline: Pipeline<'a>, scope: &'a Scope) -> Self {
        WindowEvaluator { pipeline, scope }
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    /// Trades already journaled inside `window`, without re-running anything.
    pub fn existing_trades(&self, window: &TimeWindow) -> Result<Vec<Trade>, BracketeerError> {
        self.pipeline.journal.trades_between(self.scope, window)
    }

    pub fn evaluate(
        &self,
        config: &FilterConfig,
        window: &TimeWindow,
    ) -> Result<Vec<Trade>, BracketeerError> {
        let purged = self.pipeline.journal.purge_window(self.scope, window)?;

        for (symbol, timeframe) in self.scope.pairs() {
            self.pipeline.detect(symbol, timeframe, config, Some(window))?;
        }
        self.pipeline.score(self.scope, Some(window))?;
        let executed = self.pipeline.execute(self.scope, config, Some(window))?;

        let trades = self.existing_trades(window)?;
        debug!(
            %window,
            purged,
            executed = executed.processed,
            trades = trades.len(),
            "window re-evaluated"
        );
        Ok(trades)
    }

    pub fn metrics(
        &self,
        config: &FilterConfig,
        window: &TimeWindow,
    ) -> Result<Metrics, BracketeerError> {
        Ok(Metrics::compute(&self.evaluate(config, window)?))
    }
}
