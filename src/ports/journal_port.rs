//! Candidate, trade and label journal port.
//!
//! Implementations enforce the at-most-once rules themselves: a second
//! decision, trade or label for the same parent fails with
//! [`BracketeerError::EligibilityViolation`] and leaves the stored record
//! untouched.

use crate::domain::candidate::{Candidate, Decision, Setup};
use crate::domain::error::BracketeerError;
use crate::domain::label::{Label, NewLabel};
use crate::domain::scope::Scope;
use crate::domain::trade::{NewTrade, Trade};
use crate::domain::window::TimeWindow;

/// Selection of candidates ready for execution.
#[derive(Debug, Clone)]
pub struct ExecutionQuery<'a> {
    pub scope: &'a Scope,
    /// Inclusive.
    pub min_score: f64,
    pub window: Option<&'a TimeWindow>,
}

pub trait JournalPort {
    /// Persist a setup. Returns `None` when (symbol, timeframe, timestamp)
    /// already exists.
    fn insert_candidate(&self, setup: &Setup) -> Result<Option<i64>, BracketeerError>;

    fn candidate(&self, id: i64) -> Result<Option<Candidate>, BracketeerError>;

    /// Candidates without a decision, ascending by timestamp.
    fn unscored_candidates(
        &self,
        scope: &Scope,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Candidate>, BracketeerError>;

    /// Attach the single decision a candidate may receive.
    fn record_decision(&self, candidate_id: i64, decision: &Decision) -> Result<(), BracketeerError>;

    /// Scored long/short candidates at or above the threshold with no trade
    /// yet, ascending by timestamp.
    fn executable_candidates(
        &self,
        query: &ExecutionQuery<'_>,
    ) -> Result<Vec<Candidate>, BracketeerError>;

    fn insert_trade(&self, trade: &NewTrade) -> Result<i64, BracketeerError>;

    /// Trades whose entry time falls inside `window`, ascending by entry time.
    fn trades_between(
        &self,
        scope: &Scope,
        window: &TimeWindow,
    ) -> Result<Vec<Trade>, BracketeerError>;

    /// Trades without a label, ascending by entry time.
    fn unlabeled_trades(&self) -> Result<Vec<Trade>, BracketeerError>;

    fn insert_label(&self, label: &NewLabel) -> Result<i64, BracketeerError>;

    fn labels(&self) -> Result<Vec<Label>, BracketeerError>;

    /// Delete candidates of `scope` timestamped inside `window`, together with
    /// their trades and labels. Returns the number of candidates removed.
    fn purge_window(&self, scope: &Scope, window: &TimeWindow) -> Result<usize, BracketeerError>;
}
